use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::{CoreTraits, Facet};

/// Bulk default-initialization and finalization over a contiguous block of `T`.
///
/// The helper knows nothing about where the memory came from. Strategies that separate
/// reservation from initialization ([`RawBytes`][crate::RawBytes],
/// [`ZeroedBytes`][crate::ZeroedBytes], and the allocation half of [`Boxed`][crate::Boxed])
/// call it after reserving storage and before releasing it.
pub struct Constructor<T> {
    _element: PhantomData<T>,
}

impl<T> Facet for Constructor<T> {
    crate::forward_facet!(CoreTraits<T>);
}

impl<T> Constructor<T> {
    /// Writes `T::default()` into each of the `n` slots starting at `p`, in forward index order.
    ///
    /// There is no rollback. If `T::default()` panics while constructing slot `k`, slots
    /// `0..k` remain constructed and are never finalized by this function, and the panic
    /// propagates to the caller.
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    ///
    /// 1. `p` is valid for writes of `n` consecutive `T` and is properly aligned.
    /// 2. None of the `n` slots holds a live value that still needs to be dropped.
    pub unsafe fn construct(p: NonNull<T>, n: usize)
    where
        T: Default,
    {
        for index in 0..n {
            // SAFETY: Forwarding guarantee 1 from the caller; index < n stays within the block.
            let slot = unsafe { p.add(index) };

            // SAFETY: Forwarding guarantees 1 and 2 from the caller. Overwriting without
            // dropping is correct because the slot holds no live value.
            unsafe {
                slot.write(T::default());
            }
        }
    }

    /// Drops the value in each of the `n` slots starting at `p`, in forward index order.
    ///
    /// The memory itself is not released.
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    ///
    /// 1. `p` points to `n` consecutive, properly aligned, live values of `T`.
    /// 2. None of those values is used or dropped again after this call.
    pub unsafe fn destroy(p: NonNull<T>, n: usize) {
        for index in 0..n {
            // SAFETY: Forwarding guarantee 1 from the caller; index < n stays within the block.
            let slot = unsafe { p.add(index) };

            // SAFETY: Forwarding guarantees 1 and 2 from the caller.
            unsafe {
                slot.drop_in_place();
            }
        }
    }
}

impl<T> fmt::Debug for Constructor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("element", &type_name::<T>())
            .finish()
    }
}
