use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

/// Canonical spellings of the value, reference and pointer roles of an element type, together
/// with their read-only counterparts.
///
/// The facet has no behavior. It exists so that components can be written against named roles
/// (`S::Val`, `S::CPtr`) instead of repeating type syntax. [`CoreTraits<T>`] is the canonical
/// implementation; components that wrap another component re-export the same roles via
/// [`forward_facet!`][crate::forward_facet].
///
/// # Examples
///
/// ```
/// use alloc_strategies::{CoreTraits, Facet};
///
/// fn first<F: Facet>(items: &[F::Val]) -> Option<&F::Val> {
///     items.first()
/// }
///
/// assert_eq!(first::<CoreTraits<u32>>(&[7, 8]), Some(&7));
/// ```
pub trait Facet {
    /// The element type itself.
    type Val;

    /// An exclusive reference to an element.
    type Ref<'a>
    where
        Self: 'a;

    /// A mutable pointer to an element.
    type Ptr;

    /// The element type when only read access is intended.
    type CVal;

    /// A shared reference to an element.
    type CRef<'a>
    where
        Self: 'a;

    /// A read-only pointer to an element.
    type CPtr;
}

/// The canonical [`Facet`] of `T`.
///
/// This type is never instantiated; it only carries the associated types.
pub struct CoreTraits<T> {
    _element: PhantomData<T>,
}

impl<T> Facet for CoreTraits<T> {
    type Val = T;
    type Ref<'a>
        = &'a mut T
    where
        Self: 'a;
    type Ptr = *mut T;
    type CVal = T;
    type CRef<'a>
        = &'a T
    where
        Self: 'a;
    type CPtr = *const T;
}

impl<T> fmt::Debug for CoreTraits<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreTraits")
            .field("element", &type_name::<T>())
            .finish()
    }
}

/// Implements the associated types of [`Facet`] by forwarding them to another facet.
///
/// Use inside an `impl Facet for ...` block. The target type must itself implement [`Facet`]
/// and must outlive any lifetime the implementing type outlives.
///
/// # Examples
///
/// ```
/// use std::marker::PhantomData;
///
/// use alloc_strategies::{CoreTraits, Facet, forward_facet};
///
/// struct Wrapper<T>(PhantomData<T>);
///
/// impl<T> Facet for Wrapper<T> {
///     forward_facet!(CoreTraits<T>);
/// }
///
/// let value: <Wrapper<u8> as Facet>::Val = 5;
/// let ptr: <Wrapper<u8> as Facet>::CPtr = &raw const value;
/// assert!(!ptr.is_null());
/// ```
#[macro_export]
macro_rules! forward_facet {
    ($target:ty) => {
        type Val = <$target as $crate::Facet>::Val;
        type Ref<'a>
            = <$target as $crate::Facet>::Ref<'a>
        where
            Self: 'a;
        type Ptr = <$target as $crate::Facet>::Ptr;
        type CVal = <$target as $crate::Facet>::CVal;
        type CRef<'a>
            = <$target as $crate::Facet>::CRef<'a>
        where
            Self: 'a;
        type CPtr = <$target as $crate::Facet>::CPtr;
    };
}
