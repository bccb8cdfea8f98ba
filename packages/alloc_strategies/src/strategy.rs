use std::ptr::NonNull;

use crate::{Facet, Result, StrategyKind, Tag};

/// The contract shared by every allocation strategy.
///
/// A strategy allocates a block of `n` default-initialized elements and later finalizes and
/// releases it. Strategies are stateless type-level markers: every call is independent and
/// there is nothing to construct. Select one with a type parameter, or at runtime through
/// [`StrategyKind`].
///
/// The raw contract reports exhaustion of the backing memory as `Ok(None)` and leaves pairing
/// `alloc()` with `free()` to the caller. [`Block`][crate::Block] wraps both steps into an owning
/// handle that releases the block exactly once.
///
/// # Examples
///
/// ```
/// use alloc_strategies::{RawBytes, Strategy};
///
/// let ptr = RawBytes::<u64>::alloc(3).unwrap().unwrap();
///
/// // SAFETY: alloc() initialized 3 elements.
/// assert_eq!(unsafe { ptr.add(2).read() }, 0);
///
/// // SAFETY: Same strategy, same count, freed once.
/// unsafe { RawBytes::<u64>::free(Some(ptr), 3) };
/// ```
pub trait Strategy: Facet {
    /// Marker identifying the backing mechanism of this strategy.
    type Tag: Tag;

    /// The runtime counterpart of [`Self::Tag`].
    ///
    /// Implementations must not override this constant. Generic code relies on it agreeing
    /// with `<Self::Tag as Tag>::KIND`.
    const KIND: StrategyKind = <Self::Tag as Tag>::KIND;

    /// Allocates storage for `n` elements and default-initializes every one of them.
    ///
    /// Returns `Ok(None)` if `n` is zero, in which case no element is constructed. Strategies
    /// that allocate also return `Ok(None)` if the backing memory cannot be reserved; no element
    /// is constructed in that case either.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationProhibited`][crate::Error::AllocationProhibited] if the
    /// strategy forbids allocation.
    fn alloc(n: usize) -> Result<Option<NonNull<Self::Val>>>
    where
        Self::Val: Default;

    /// Finalizes every element of a block and releases its memory.
    ///
    /// Does nothing if `ptr` is `None` or `n` is zero.
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    ///
    /// 1. `ptr` is `None` or was returned by `alloc(n)` of this same strategy, with the same `n`.
    /// 2. The block has not already been freed and no element of it is used afterwards.
    ///
    /// Nothing detects a mismatched strategy, a mismatched count or a double free.
    unsafe fn free(ptr: Option<NonNull<Self::Val>>, n: usize);
}
