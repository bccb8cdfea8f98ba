use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::fmt;
use std::ptr;
use std::thread::LocalKey;

// Const-initialized and free of destructors, so the allocator may touch them at any point,
// including while thread-local storage of other types is being torn down.
thread_local! {
    static ALLOCATIONS: Cell<u64> = const { Cell::new(0) };
    static DEALLOCATIONS: Cell<u64> = const { Cell::new(0) };
    static BYTES_ALLOCATED: Cell<u64> = const { Cell::new(0) };
    static BYTES_DEALLOCATED: Cell<u64> = const { Cell::new(0) };
    static FAIL_NEXT: Cell<bool> = const { Cell::new(false) };
}

fn bump(counter: &'static LocalKey<Cell<u64>>, amount: usize) {
    let amount: u64 = amount.try_into().expect("usize always fits into u64");

    // If the thread is shutting down, the counts no longer matter to anyone.
    _ = counter.try_with(|cell| cell.set(cell.get().wrapping_add(amount)));
}

fn take_failure() -> bool {
    FAIL_NEXT.try_with(|flag| flag.replace(false)).unwrap_or(false)
}

/// Makes the next allocation on the current thread fail by returning null.
///
/// Only has an effect when [`CountingAllocator`] is installed as the global allocator.
/// The flag is one-shot: it resets as soon as an allocation observes it.
pub fn fail_next_allocation() {
    FAIL_NEXT.with(|flag| flag.set(true));
}

/// Allocation activity of the current thread, as seen by [`CountingAllocator`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub struct AllocationCounts {
    /// Number of successful allocations.
    pub allocations: u64,

    /// Number of deallocations.
    pub deallocations: u64,

    /// Bytes handed out by successful allocations.
    pub bytes_allocated: u64,

    /// Bytes returned by deallocations.
    pub bytes_deallocated: u64,
}

impl AllocationCounts {
    /// Takes a snapshot of the current thread's counters.
    #[must_use]
    pub fn current() -> Self {
        Self {
            allocations: ALLOCATIONS.with(Cell::get),
            deallocations: DEALLOCATIONS.with(Cell::get),
            bytes_allocated: BYTES_ALLOCATED.with(Cell::get),
            bytes_deallocated: BYTES_DEALLOCATED.with(Cell::get),
        }
    }

    /// The activity between an earlier snapshot and this one.
    #[must_use]
    pub fn since(&self, earlier: &Self) -> Self {
        Self {
            allocations: self.allocations.wrapping_sub(earlier.allocations),
            deallocations: self.deallocations.wrapping_sub(earlier.deallocations),
            bytes_allocated: self.bytes_allocated.wrapping_sub(earlier.bytes_allocated),
            bytes_deallocated: self.bytes_deallocated.wrapping_sub(earlier.bytes_deallocated),
        }
    }

    /// Whether every byte allocated was also deallocated.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.allocations == self.deallocations && self.bytes_allocated == self.bytes_deallocated
    }
}

/// A global allocator wrapper that counts allocation activity per thread and supports
/// injecting a single allocation failure.
///
/// # Examples
///
/// ```ignore
/// use testing::{AllocationCounts, CountingAllocator};
///
/// #[global_allocator]
/// static ALLOCATOR: CountingAllocator<std::alloc::System> = CountingAllocator::system();
///
/// let before = AllocationCounts::current();
/// drop(vec![1_u8; 32]);
/// assert!(AllocationCounts::current().since(&before).is_balanced());
/// ```
pub struct CountingAllocator<A: GlobalAlloc> {
    inner: A,
}

impl<A: GlobalAlloc> fmt::Debug for CountingAllocator<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountingAllocator")
            .field("inner", &"<allocator>")
            .finish()
    }
}

impl CountingAllocator<System> {
    /// Creates a counting allocator on top of the system allocator.
    #[must_use]
    pub const fn system() -> Self {
        Self { inner: System }
    }
}

impl<A: GlobalAlloc> CountingAllocator<A> {
    /// Creates a counting allocator on top of the provided allocator.
    #[must_use]
    pub const fn new(inner: A) -> Self {
        Self { inner }
    }

    fn record(ptr: *mut u8, size: usize) -> *mut u8 {
        if !ptr.is_null() {
            bump(&ALLOCATIONS, 1);
            bump(&BYTES_ALLOCATED, size);
        }

        ptr
    }
}

// SAFETY: Every call is forwarded to the inner allocator, which implements GlobalAlloc.
// Failure injection returns null, which is a permitted outcome of every allocating method.
unsafe impl<A: GlobalAlloc> GlobalAlloc for CountingAllocator<A> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if take_failure() {
            return ptr::null_mut();
        }

        // SAFETY: Forwarding the caller's guarantees to the inner allocator.
        let ptr = unsafe { self.inner.alloc(layout) };
        Self::record(ptr, layout.size())
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        if take_failure() {
            return ptr::null_mut();
        }

        // SAFETY: Forwarding the caller's guarantees to the inner allocator.
        let ptr = unsafe { self.inner.alloc_zeroed(layout) };
        Self::record(ptr, layout.size())
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        bump(&DEALLOCATIONS, 1);
        bump(&BYTES_DEALLOCATED, layout.size());

        // SAFETY: Forwarding the caller's guarantees to the inner allocator.
        unsafe { self.inner.dealloc(ptr, layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if take_failure() {
            return ptr::null_mut();
        }

        // SAFETY: Forwarding the caller's guarantees to the inner allocator.
        let new_ptr = unsafe { self.inner.realloc(ptr, layout, new_size) };

        if !new_ptr.is_null() {
            bump(&DEALLOCATIONS, 1);
            bump(&BYTES_DEALLOCATED, layout.size());
        }

        Self::record(new_ptr, new_size)
    }
}
