use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

use tracing::trace;

use crate::bytes::{self, Fill};
use crate::{BoxedTag, Constructor, CoreTraits, Facet, Result, Strategy};

/// The general-purpose strategy: constructs on allocate, finalizes and releases through `Box`.
///
/// [`alloc()`][Strategy::alloc] reserves storage from the global allocator, reporting failure
/// as `Ok(None)` instead of aborting, and default-initializes every element.
///
/// [`free()`][Strategy::free] hands the block back to `Box`, which finalizes and releases it
/// in one step: a single element goes through `Box<T>`, more than one through `Box<[T]>`.
/// There is no separate destroy call.
///
/// This is the default choice for element types with non-trivial construction or drop logic.
///
/// # Examples
///
/// ```
/// use alloc_strategies::{Block, Boxed};
///
/// let mut names = Block::<Boxed<String>>::new(2).unwrap();
/// names[0].push_str("hello");
///
/// assert_eq!(names.as_slice(), ["hello".to_string(), String::new()]);
/// ```
pub struct Boxed<T> {
    _element: PhantomData<T>,
}

impl<T> Facet for Boxed<T> {
    crate::forward_facet!(CoreTraits<T>);
}

impl<T> Strategy for Boxed<T> {
    type Tag = BoxedTag;

    fn alloc(n: usize) -> Result<Option<NonNull<T>>>
    where
        T: Default,
    {
        if n == 0 {
            return Ok(None);
        }

        // Box<T> and Box<[T]> use the same layout as an array of `n` elements allocated from
        // the global allocator, so either can take ownership of this reservation.
        let Some(ptr) = bytes::reserve::<T>(n, Fill::Uninit) else {
            return Ok(None);
        };

        // SAFETY: The reservation is valid for `n` elements and holds no live values.
        unsafe {
            Constructor::construct(ptr, n);
        }

        trace!(strategy = %Self::KIND, count = n, element = type_name::<T>(), "allocated");

        Ok(Some(ptr))
    }

    unsafe fn free(ptr: Option<NonNull<T>>, n: usize) {
        let Some(ptr) = ptr else {
            return;
        };

        match n {
            0 => return,
            1 => {
                // SAFETY: The caller guarantees the block came from alloc(1), which reserved
                // the layout of one T from the global allocator and constructed it.
                drop(unsafe { Box::from_raw(ptr.as_ptr()) });
            }
            _ => {
                let slice = ptr::slice_from_raw_parts_mut(ptr.as_ptr(), n);

                // SAFETY: The caller guarantees the block came from alloc(n), which reserved the
                // layout of [T; n] from the global allocator and constructed every element.
                drop(unsafe { Box::from_raw(slice) });
            }
        }

        trace!(strategy = %Self::KIND, count = n, element = type_name::<T>(), "freed");
    }
}

impl<T> fmt::Debug for Boxed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Boxed")
            .field("element", &type_name::<T>())
            .finish()
    }
}
