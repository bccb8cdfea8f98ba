use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use tracing::trace;

use crate::bytes::{self, Fill};
use crate::{Constructor, CoreTraits, Facet, Result, Strategy, ZeroedBytesTag};

/// A strategy that reserves zeroed bytes and constructs elements in them explicitly.
///
/// Identical to [`RawBytes`][crate::RawBytes] except that [`reserve()`][Self::reserve]
/// guarantees every byte of the block is zero before construction runs. Construction still
/// runs afterwards, so element types whose default is not all-zero are initialized correctly.
///
/// Generic code can detect this strategy through its tag and skip manual zeroing:
///
/// ```
/// use alloc_strategies::{Strategy, StrategyKind, ZeroedBytes};
///
/// assert!(ZeroedBytes::<u64>::KIND.zeroes_memory());
/// assert_eq!(ZeroedBytes::<u64>::KIND, StrategyKind::ZeroedBytes);
/// ```
pub struct ZeroedBytes<T> {
    _element: PhantomData<T>,
}

impl<T> Facet for ZeroedBytes<T> {
    crate::forward_facet!(CoreTraits<T>);
}

impl<T> ZeroedBytes<T> {
    /// Reserves storage for `n` elements with every byte set to zero, without constructing
    /// anything.
    ///
    /// Returns `None` if `n` is zero, if the size overflows or if the global allocator cannot
    /// satisfy the request.
    #[must_use]
    pub fn reserve(n: usize) -> Option<NonNull<T>> {
        if n == 0 {
            return None;
        }

        bytes::reserve(n, Fill::Zeroed)
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

impl<T> Strategy for ZeroedBytes<T> {
    type Tag = ZeroedBytesTag;

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

impl<T> fmt::Debug for ZeroedBytes<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZeroedBytes")
            .field("element", &type_name::<T>())
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::slice;

    use testing::{Probe, ProbeScope};

    use super::*;

    #[derive(Debug, PartialEq)]
    struct Seven(u32);

    impl Default for Seven {
        fn default() -> Self {
            Self(7)
        }
    }

    #[test]
    fn reserved_bytes_are_zero_before_construction() {
        let ptr = ZeroedBytes::<u64>::reserve(32).unwrap();

        // SAFETY: 32 u64 were reserved; every byte of them is initialized to zero.
        let raw = unsafe { slice::from_raw_parts(ptr.as_ptr().cast::<u8>(), 32 * 8) };
        assert!(raw.iter().all(|b| *b == 0));

        // SAFETY: Same count as the reservation; u64 needs no finalization.
        unsafe {
            ZeroedBytes::release(ptr, 32);
        }
    }

    #[test]
    fn alloc_yields_default_values() {
        let ptr = ZeroedBytes::<u64>::alloc(16).unwrap().unwrap();

        // SAFETY: alloc() constructed 16 elements.
        let values = unsafe { slice::from_raw_parts(ptr.as_ptr(), 16) };
        assert!(values.iter().all(|v| *v == 0));

        // SAFETY: Same strategy, same count, freed once.
        unsafe {
            ZeroedBytes::<u64>::free(Some(ptr), 16);
        }
    }

    #[test]
    fn construction_runs_after_zeroing() {
        let ptr = ZeroedBytes::<Seven>::alloc(3).unwrap().unwrap();

        // SAFETY: alloc() constructed 3 elements.
        let values = unsafe { slice::from_raw_parts(ptr.as_ptr(), 3) };
        assert_eq!(values, [Seven(7), Seven(7), Seven(7)]);

        // SAFETY: Same strategy, same count, freed once.
        unsafe {
            ZeroedBytes::<Seven>::free(Some(ptr), 3);
        }
    }

    #[test]
    fn alloc_free_is_balanced() {
        let scope = ProbeScope::begin();

        let ptr = ZeroedBytes::<Probe>::alloc(5).unwrap();
        assert_eq!(scope.constructed(), 5);

        // SAFETY: Same strategy, same count, freed once.
        unsafe {
            ZeroedBytes::<Probe>::free(ptr, 5);
        }
        assert_eq!(scope.finalized(), 5);
        assert_eq!(scope.finalized_ids(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn zero_count_allocates_nothing() {
        let scope = ProbeScope::begin();

        assert!(ZeroedBytes::<Probe>::alloc(0).unwrap().is_none());
        assert!(ZeroedBytes::<Probe>::reserve(0).is_none());

        // SAFETY: None is always accepted.
        unsafe {
            ZeroedBytes::<Probe>::free(None, 0);
        }

        assert_eq!(scope.constructed(), 0);
        assert_eq!(scope.finalized(), 0);
    }
}
