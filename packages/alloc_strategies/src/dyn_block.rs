use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::slice;

use crate::{Error, Result, StrategyKind};

/// Owns one block of default-initialized elements allocated by a strategy chosen at runtime.
///
/// This is the runtime-dispatched counterpart of [`Block`][crate::Block]. The strategy is
/// remembered in the handle and used again when the block is dropped, so the pairing of
/// allocation and release cannot be mismatched.
///
/// # Examples
///
/// ```
/// use alloc_strategies::{DynBlock, StrategyKind};
///
/// // The policy could come from a configuration file.
/// let kind: StrategyKind = "malloc".parse().unwrap();
///
/// let mut buffer = DynBlock::<u8>::new(kind, 16).unwrap();
/// buffer[0] = 0xff;
///
/// assert_eq!(buffer.kind(), StrategyKind::RawBytes);
/// assert_eq!(buffer.len(), 16);
/// ```
pub struct DynBlock<T> {
    kind: StrategyKind,
    ptr: Option<NonNull<T>>,
    len: usize,

    _owns: PhantomData<T>,
}

impl<T> DynBlock<T> {
    /// Allocates a block of `n` default-initialized elements with the strategy `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationProhibited`] if the strategy forbids allocation and
    /// [`Error::AllocationExhausted`] if the backing memory could not be reserved.
    pub fn new(kind: StrategyKind, n: usize) -> Result<Self>
    where
        T: Default,
    {
        let ptr = kind.alloc::<T>(n)?;

        if ptr.is_none() && n != 0 {
            return Err(Error::AllocationExhausted {
                count: n,
                element: type_name::<T>(),
            });
        }

        Ok(Self {
            kind,
            ptr,
            len: n,
            _owns: PhantomData,
        })
    }

    /// Takes ownership of a block previously allocated through `kind`.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `ptr` is `None` with `n == 0`, or was returned by
    /// `kind.alloc::<T>(n)` with the same `n` and is not freed or owned by anyone else.
    #[must_use]
    pub unsafe fn from_raw(kind: StrategyKind, ptr: Option<NonNull<T>>, n: usize) -> Self {
        Self {
            kind,
            ptr,
            len: n,
            _owns: PhantomData,
        }
    }

    /// Gives up ownership, returning everything needed to call [`StrategyKind::free`] later.
    #[must_use]
    pub fn into_raw(self) -> (StrategyKind, Option<NonNull<T>>, usize) {
        let this = ManuallyDrop::new(self);
        (this.kind, this.ptr, this.len)
    }

    /// The strategy that allocated the block and will release it.
    #[must_use]
    pub fn kind(&self) -> StrategyKind {
        self.kind
    }

    /// The number of elements in the block.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the block has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// A pointer to the first element, or `None` for an empty block.
    #[must_use]
    pub fn as_ptr(&self) -> Option<NonNull<T>> {
        self.ptr
    }

    /// The elements as a shared slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        match self.ptr {
            // SAFETY: The block owns `len` live elements at `ptr` and we hold a shared borrow.
            Some(ptr) => unsafe { slice::from_raw_parts(ptr.as_ptr(), self.len) },
            None => &[],
        }
    }

    /// The elements as an exclusive slice.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match self.ptr {
            // SAFETY: The block owns `len` live elements at `ptr` and we hold an exclusive borrow.
            Some(ptr) => unsafe { slice::from_raw_parts_mut(ptr.as_ptr(), self.len) },
            None => &mut [],
        }
    }
}

impl<T> Deref for DynBlock<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T> DerefMut for DynBlock<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<T> Drop for DynBlock<T> {
    fn drop(&mut self) {
        // SAFETY: The block was produced by kind.alloc(len) (or handed over via from_raw() with
        // the same guarantee) and Drop runs only once.
        unsafe {
            self.kind.free(self.ptr, self.len);
        }
    }
}

#[expect(
    clippy::missing_fields_in_debug,
    reason = "the pointer and length are shown as the items they address"
)]
impl<T: fmt::Debug> fmt::Debug for DynBlock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynBlock")
            .field("strategy", &self.kind)
            .field("items", &self.as_slice())
            .finish()
    }
}

// SAFETY: The block uniquely owns its elements, so moving it to another thread moves the
// elements, which is fine when they are Send.
unsafe impl<T: Send> Send for DynBlock<T> {}

// SAFETY: Shared access to the block only hands out shared references to the elements.
unsafe impl<T: Sync> Sync for DynBlock<T> {}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::rc::Rc;

    use static_assertions::{assert_impl_all, assert_not_impl_any};
    use testing::{Probe, ProbeScope};

    use super::*;

    assert_impl_all!(DynBlock<u32>: Send, Sync, fmt::Debug);
    assert_not_impl_any!(DynBlock<Rc<u32>>: Send, Sync);

    #[test]
    fn every_allocating_kind_is_balanced() {
        for kind in StrategyKind::ALL.into_iter().filter(|kind| kind.allocates()) {
            let scope = ProbeScope::begin();

            let block = DynBlock::<Probe>::new(kind, 9).unwrap();
            assert_eq!(block.kind(), kind);
            assert_eq!(scope.constructed(), 9);
            drop(block);

            assert_eq!(scope.finalized(), 9, "{kind} did not finalize every element");
        }
    }

    #[test]
    fn no_alloc_kind_is_refused() {
        let error = DynBlock::<Probe>::new(StrategyKind::NoAlloc, 1).unwrap_err();

        assert!(matches!(error, Error::AllocationProhibited { count: 1, .. }));
    }

    #[test]
    fn zero_count_is_empty_for_allocating_kinds() {
        let block = DynBlock::<u64>::new(StrategyKind::Boxed, 0).unwrap();

        assert!(block.is_empty());
        assert!(block.as_ptr().is_none());
    }

    #[test]
    fn raw_round_trip_remembers_kind() {
        let scope = ProbeScope::begin();

        let block = DynBlock::<Probe>::new(StrategyKind::ZeroedBytes, 2).unwrap();
        let (kind, ptr, n) = block.into_raw();
        assert_eq!(kind, StrategyKind::ZeroedBytes);
        assert_eq!(scope.finalized(), 0);

        // SAFETY: Everything came from into_raw() of a live block.
        drop(unsafe { DynBlock::<Probe>::from_raw(kind, ptr, n) });
        assert_eq!(scope.finalized(), 2);
    }

    #[test]
    fn debug_shows_kind_and_items() {
        let mut block = DynBlock::<i8>::new(StrategyKind::Boxed, 3).unwrap();
        *block.get_mut(1).expect("block has three elements") = -1;

        assert_eq!(
            format!("{block:?}"),
            "DynBlock { strategy: Boxed, items: [0, -1, 0] }"
        );
    }
}
