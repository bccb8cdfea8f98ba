use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use tracing::debug;

use crate::{CoreTraits, Error, Facet, NoAllocTag, Result, Strategy};

/// A strategy that forbids allocation.
///
/// Every [`alloc()`][Strategy::alloc] call fails with [`Error::AllocationProhibited`], whatever
/// the count. [`free()`][Strategy::free] accepts anything and does nothing. Substitute this
/// strategy into a code path to prove that it never allocates, without changing call sites.
///
/// # Examples
///
/// ```
/// use alloc_strategies::{Error, NoAlloc, Strategy};
///
/// let result = NoAlloc::<String>::alloc(1);
/// assert!(matches!(result, Err(Error::AllocationProhibited { count: 1, .. })));
/// ```
pub struct NoAlloc<T> {
    _element: PhantomData<T>,
}

impl<T> Facet for NoAlloc<T> {
    crate::forward_facet!(CoreTraits<T>);
}

impl<T> Strategy for NoAlloc<T> {
    type Tag = NoAllocTag;

    fn alloc(n: usize) -> Result<Option<NonNull<T>>>
    where
        T: Default,
    {
        debug!(
            strategy = %Self::KIND,
            count = n,
            element = type_name::<T>(),
            "prohibited allocation attempted"
        );

        Err(Error::AllocationProhibited {
            count: n,
            element: type_name::<T>(),
        })
    }

    unsafe fn free(_ptr: Option<NonNull<T>>, _n: usize) {}
}

impl<T> fmt::Debug for NoAlloc<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoAlloc")
            .field("element", &type_name::<T>())
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use testing::{Probe, ProbeScope};

    use super::*;

    #[test]
    fn alloc_is_always_prohibited() {
        for n in [0, 1, 1000] {
            let error = NoAlloc::<u64>::alloc(n).unwrap_err();

            assert!(matches!(
                error,
                Error::AllocationProhibited { count, element } if count == n && element == "u64"
            ));
        }
    }

    #[test]
    fn alloc_constructs_nothing() {
        let scope = ProbeScope::begin();

        NoAlloc::<Probe>::alloc(10).unwrap_err();

        assert_eq!(scope.constructed(), 0);
    }

    #[test]
    fn free_is_a_no_op_for_any_input() {
        let scope = ProbeScope::begin();
        let mut live = Probe::default();

        // SAFETY: NoAlloc::free never touches its input.
        unsafe {
            NoAlloc::<Probe>::free(None, 0);
        }
        // SAFETY: As above.
        unsafe {
            NoAlloc::<Probe>::free(None, 5);
        }
        // SAFETY: As above; the pointer is valid but must not be finalized.
        unsafe {
            NoAlloc::<Probe>::free(Some(NonNull::from(&mut live)), 1);
        }
        // SAFETY: As above; a dangling pointer is never dereferenced.
        unsafe {
            NoAlloc::<Probe>::free(Some(NonNull::dangling()), 1000);
        }

        assert_eq!(scope.finalized(), 0);
        drop(live);
        assert_eq!(scope.finalized(), 1);
    }
}
