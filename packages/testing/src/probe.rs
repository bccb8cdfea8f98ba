use std::cell::RefCell;
use std::marker::PhantomData;

/// Per-thread record of every [`Probe`] constructed and finalized since the last
/// [`ProbeScope::begin()`].
#[derive(Debug, Default)]
struct Ledger {
    constructed: usize,
    finalized: Vec<(usize, u64)>,
    panic_on_construction: Option<usize>,
}

thread_local! {
    static LEDGER: RefCell<Ledger> = RefCell::new(Ledger::default());
}

/// An instrumented element type that records its default construction and its finalization.
///
/// Each probe gets an id equal to the number of probes constructed before it on the same
/// thread since the current [`ProbeScope`] began, so a block of probes constructed in index
/// order carries ids `0..n`. When dropped, the probe records its id and current value.
///
/// The ledger is thread-local, which keeps tests running in parallel from seeing each other.
#[derive(Debug)]
pub struct Probe {
    id: usize,
    value: u64,
}

impl Probe {
    /// The construction order of this probe within the current scope.
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// The value carried by the probe. Starts at zero.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Replaces the value carried by the probe. The value is recorded on finalization.
    pub fn set_value(&mut self, value: u64) {
        self.value = value;
    }
}

impl Default for Probe {
    fn default() -> Self {
        let id = LEDGER.with_borrow_mut(|ledger| {
            if ledger.panic_on_construction == Some(ledger.constructed) {
                ledger.panic_on_construction = None;
                return None;
            }

            let id = ledger.constructed;
            ledger.constructed = ledger.constructed.wrapping_add(1);
            Some(id)
        });

        let Some(id) = id else {
            panic!("probe construction failed on request");
        };

        Self { id, value: 0 }
    }
}

impl Drop for Probe {
    fn drop(&mut self) {
        LEDGER.with_borrow_mut(|ledger| ledger.finalized.push((self.id, self.value)));
    }
}

/// Resets the probe ledger of the current thread and gives access to it.
///
/// Create one at the start of a test, before any probe is constructed.
#[derive(Debug)]
pub struct ProbeScope {
    // The ledger is thread-local, so the scope must stay on the thread that created it.
    _not_send: PhantomData<*const ()>,
}

impl ProbeScope {
    /// Starts a new scope, forgetting everything recorded before on this thread.
    #[must_use]
    pub fn begin() -> Self {
        LEDGER.with_borrow_mut(|ledger| *ledger = Ledger::default());

        Self {
            _not_send: PhantomData,
        }
    }

    /// The number of probes constructed in this scope.
    #[must_use]
    pub fn constructed(&self) -> usize {
        LEDGER.with_borrow(|ledger| ledger.constructed)
    }

    /// The number of probes finalized in this scope.
    #[must_use]
    pub fn finalized(&self) -> usize {
        LEDGER.with_borrow(|ledger| ledger.finalized.len())
    }

    /// The ids of finalized probes, in finalization order.
    #[must_use]
    pub fn finalized_ids(&self) -> Vec<usize> {
        LEDGER.with_borrow(|ledger| ledger.finalized.iter().map(|(id, _)| *id).collect())
    }

    /// The values probes carried when finalized, in finalization order.
    #[must_use]
    pub fn finalized_values(&self) -> Vec<u64> {
        LEDGER.with_borrow(|ledger| ledger.finalized.iter().map(|(_, value)| *value).collect())
    }

    /// Makes the construction of the probe with the given id panic instead.
    ///
    /// The panic fires once; later constructions succeed and continue numbering from `id`.
    pub fn panic_on_construction(&self, id: usize) {
        LEDGER.with_borrow_mut(|ledger| ledger.panic_on_construction = Some(id));
    }
}

impl Drop for ProbeScope {
    fn drop(&mut self) {
        LEDGER.with_borrow_mut(|ledger| ledger.panic_on_construction = None);
    }
}

#[cfg(test)]
mod tests {
    use std::panic;

    use static_assertions::assert_not_impl_any;

    use super::*;

    assert_not_impl_any!(ProbeScope: Send, Sync);

    #[test]
    fn ids_follow_construction_order() {
        let scope = ProbeScope::begin();

        let probes = [Probe::default(), Probe::default(), Probe::default()];
        assert_eq!(probes.iter().map(Probe::id).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(scope.constructed(), 3);

        drop(probes);
        assert_eq!(scope.finalized_ids(), vec![0, 1, 2]);
    }

    #[test]
    fn values_are_recorded_on_finalization() {
        let scope = ProbeScope::begin();

        let mut probe = Probe::default();
        probe.set_value(99);
        assert_eq!(probe.value(), 99);
        drop(probe);

        assert_eq!(scope.finalized_values(), vec![99]);
    }

    #[test]
    fn begin_resets_the_ledger() {
        let first = ProbeScope::begin();
        drop(Probe::default());
        assert_eq!(first.finalized(), 1);
        drop(first);

        let second = ProbeScope::begin();
        assert_eq!(second.constructed(), 0);
        assert_eq!(second.finalized(), 0);
    }

    #[test]
    fn requested_panic_fires_once() {
        let scope = ProbeScope::begin();
        scope.panic_on_construction(1);

        let first = Probe::default();
        panic::catch_unwind(Probe::default).unwrap_err();
        let second = Probe::default();

        assert_eq!(first.id(), 0);
        assert_eq!(second.id(), 1);
        assert_eq!(scope.constructed(), 2);
    }
}
