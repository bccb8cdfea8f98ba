#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(coverage_nightly, coverage(off))] // This is all test code, no need to test it.

//! Private helpers for testing and benchmarking the allocation strategies.
//!
//! * [`Probe`] and [`ProbeScope`] count constructions and finalizations of an instrumented
//!   element type, remembering the order in which elements were finalized.
//! * [`CountingAllocator`] wraps a global allocator, counts allocations and deallocations per
//!   thread and can be told to fail the next allocation on the current thread.

mod allocator;
mod probe;

pub use allocator::*;
pub use probe::*;
