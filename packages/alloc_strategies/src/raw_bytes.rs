use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use tracing::trace;

use crate::bytes::{self, Fill};
use crate::{Constructor, CoreTraits, Facet, RawBytesTag, Result, Strategy};

/// A strategy that reserves uninitialized bytes and constructs elements in them explicitly.
///
/// Reservation and construction are two separate steps, glued together by
/// [`alloc()`][Strategy::alloc]: [`reserve()`][Self::reserve] obtains `n * size_of::<T>()`
/// bytes from the global allocator, then [`Constructor::construct`] default-initializes each
/// slot. [`free()`][Strategy::free] runs [`Constructor::destroy`] and then
/// [`release()`][Self::release].
///
/// # Examples
///
/// ```
/// use alloc_strategies::{Block, RawBytes};
///
/// let mut samples = Block::<RawBytes<f32>>::new(8).unwrap();
/// samples[3] = 0.5;
///
/// assert_eq!(samples.iter().sum::<f32>(), 0.5);
/// ```
pub struct RawBytes<T> {
    _element: PhantomData<T>,
}

impl<T> Facet for RawBytes<T> {
    crate::forward_facet!(CoreTraits<T>);
}

impl<T> RawBytes<T> {
    /// Reserves uninitialized storage for `n` elements without constructing anything.
    ///
    /// Returns `None` if `n` is zero, if the size overflows or if the global allocator cannot
    /// satisfy the request.
    #[must_use]
    pub fn reserve(n: usize) -> Option<NonNull<T>> {
        if n == 0 {
            return None;
        }

        bytes::reserve(n, Fill::Uninit)
    }

    /// Returns storage obtained from [`reserve()`][Self::reserve] without finalizing anything.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `ptr` was returned by `reserve(n)` with the same `n`, that
    /// it has not been released yet and that any values it holds have already been finalized
    /// or may be leaked.
    pub unsafe fn release(ptr: NonNull<T>, n: usize) {
        // SAFETY: Forwarding the caller's guarantees.
        unsafe {
            bytes::release(ptr, n);
        }
    }
}

impl<T> Strategy for RawBytes<T> {
    type Tag = RawBytesTag;

    fn alloc(n: usize) -> Result<Option<NonNull<T>>>
    where
        T: Default,
    {
        let Some(ptr) = Self::reserve(n) else {
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

        if n == 0 {
            return;
        }

        // SAFETY: The caller guarantees the block came from alloc(n), so all `n` elements are
        // live and are not used after this call.
        unsafe {
            Constructor::destroy(ptr, n);
        }

        // SAFETY: alloc(n) obtained the block from reserve(n) and it is released only once.
        unsafe {
            Self::release(ptr, n);
        }

        trace!(strategy = %Self::KIND, count = n, element = type_name::<T>(), "freed");
    }
}

impl<T> fmt::Debug for RawBytes<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBytes")
            .field("element", &type_name::<T>())
            .finish()
    }
}
