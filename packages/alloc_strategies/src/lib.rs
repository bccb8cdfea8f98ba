#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Interchangeable allocation strategies sharing one contract: allocate storage for `n`
//! elements of a type and default-initialize all of them, then later finalize and release
//! the block.
//!
//! Each strategy combines a backing mechanism with an initialization policy:
//!
//! | Strategy | Backing memory | Initialization | Release |
//! |---|---|---|---|
//! | [`NoAlloc`] | none, every allocation fails | - | no-op |
//! | [`Boxed`] | global allocator | constructed on allocate | `Box<T>` / `Box<[T]>` drops and frees |
//! | [`RawBytes`] | uninitialized bytes | explicit [`Constructor::construct`] | explicit [`Constructor::destroy`], then dealloc |
//! | [`ZeroedBytes`] | zeroed bytes | explicit [`Constructor::construct`] | explicit [`Constructor::destroy`], then dealloc |
//!
//! Calling code picks a strategy through a type parameter and keeps its call sites unchanged
//! when the policy changes. Swapping in [`NoAlloc`] proves that a code path never allocates.
//!
//! # Raw contract
//!
//! Every strategy implements [`Strategy`]: `alloc(n)` returns a pointer to `n` live elements
//! (or `None` if `n` is zero or memory is exhausted) and `free(ptr, n)` ends their lifetime.
//! Pairing the two calls correctly is the caller's responsibility.
//!
//! ```
//! use alloc_strategies::{Strategy, ZeroedBytes};
//!
//! let ptr = ZeroedBytes::<u32>::alloc(4).unwrap().unwrap();
//!
//! // SAFETY: Same strategy and same count as the allocation, freed once.
//! unsafe { ZeroedBytes::<u32>::free(Some(ptr), 4) };
//! ```
//!
//! # Owning handles
//!
//! [`Block<S>`] owns one allocation and releases it when dropped. [`DynBlock<T>`] does the
//! same for a strategy selected at runtime through [`StrategyKind`].
//!
//! ```
//! use alloc_strategies::{Block, Boxed, DynBlock, StrategyKind};
//!
//! let mut words = Block::<Boxed<String>>::new(2).unwrap();
//! words[0].push_str("first");
//! assert_eq!(words.len(), 2);
//!
//! let numbers = DynBlock::<u64>::new(StrategyKind::ZeroedBytes, 8).unwrap();
//! assert!(numbers.iter().all(|n| *n == 0));
//! ```
//!
//! # Compile-time dispatch
//!
//! Each strategy carries a [`Tag`]; generic code can query it without any runtime cost,
//! for example to skip manual zeroing when the memory is already zeroed.
//!
//! ```
//! use alloc_strategies::{Block, Strategy, ZeroedBytes};
//!
//! fn zeroed_counters<S: Strategy<Val = u64>>(n: usize) -> Block<S> {
//!     let mut block = Block::<S>::new(n).unwrap();
//!
//!     if !S::KIND.zeroes_memory() {
//!         block.fill(0);
//!     }
//!
//!     block
//! }
//!
//! assert_eq!(zeroed_counters::<ZeroedBytes<u64>>(3).as_slice(), [0, 0, 0]);
//! ```
//!
//! # Partial construction
//!
//! Construction is not rolled back. If `T::default()` panics partway through a block, the
//! elements constructed before the panic are neither finalized nor released and the panic
//! propagates to the caller.
//!
//! # Logging
//!
//! Allocation and release are reported as `tracing` events at `trace` level; refused and
//! failed reservations at `debug` level. The crate never installs a subscriber.
//!
//! # Thread safety
//!
//! Strategies hold no state and perform no synchronization. Different blocks may be allocated
//! and freed concurrently from different threads; a single block has a single owner.

mod block;
mod boxed;
mod bytes;
mod constructor;
mod dyn_block;
mod error;
mod facet;
mod no_alloc;
mod raw_bytes;
mod strategy;
mod tag;
mod zeroed_bytes;

pub use block::*;
pub use boxed::*;
pub use constructor::*;
pub use dyn_block::*;
pub use error::*;
pub use facet::*;
pub use no_alloc::*;
pub use raw_bytes::*;
pub use strategy::*;
pub use tag::*;
pub use zeroed_bytes::*;
