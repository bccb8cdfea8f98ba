use std::fmt;
use std::ptr::NonNull;
use std::str::FromStr;

use crate::{Boxed, Error, NoAlloc, RawBytes, Result, Strategy, ZeroedBytes};

/// Identifies the backing mechanism of a strategy at the type level.
///
/// Each strategy names its tag through [`Strategy::Tag`]. Consumers branch on
/// [`Tag::KIND`] (also reachable as [`Strategy::KIND`]) in generic code, which resolves at
/// compile time:
///
/// ```
/// use alloc_strategies::{Strategy, Tag, ZeroedBytes};
///
/// fn needs_manual_zeroing<S: Strategy>() -> bool {
///     !<S::Tag as Tag>::KIND.zeroes_memory()
/// }
///
/// assert!(!needs_manual_zeroing::<ZeroedBytes<u8>>());
/// ```
pub trait Tag: sealed::Sealed {
    /// The runtime counterpart of the tag.
    const KIND: StrategyKind;
}

/// Tag of [`NoAlloc`].
#[derive(Debug)]
#[allow(clippy::exhaustive_enums, reason = "uninhabited marker, never gains variants")]
pub enum NoAllocTag {}

/// Tag of [`Boxed`].
#[derive(Debug)]
#[allow(clippy::exhaustive_enums, reason = "uninhabited marker, never gains variants")]
pub enum BoxedTag {}

/// Tag of [`RawBytes`].
#[derive(Debug)]
#[allow(clippy::exhaustive_enums, reason = "uninhabited marker, never gains variants")]
pub enum RawBytesTag {}

/// Tag of [`ZeroedBytes`].
#[derive(Debug)]
#[allow(clippy::exhaustive_enums, reason = "uninhabited marker, never gains variants")]
pub enum ZeroedBytesTag {}

impl Tag for NoAllocTag {
    const KIND: StrategyKind = StrategyKind::NoAlloc;
}

impl Tag for BoxedTag {
    const KIND: StrategyKind = StrategyKind::Boxed;
}

impl Tag for RawBytesTag {
    const KIND: StrategyKind = StrategyKind::RawBytes;
}

impl Tag for ZeroedBytesTag {
    const KIND: StrategyKind = StrategyKind::ZeroedBytes;
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::NoAllocTag {}
    impl Sealed for super::BoxedTag {}
    impl Sealed for super::RawBytesTag {}
    impl Sealed for super::ZeroedBytesTag {}
}

/// Selects a strategy at runtime.
///
/// This is the closed set of strategies the crate offers. It is useful when the policy comes
/// from configuration rather than from a type parameter. Parsing accepts the canonical names
/// printed by [`Display`][fmt::Display] as well as the traditional allocator names
/// (`noalloc`, `new`, `malloc`, `calloc`), ignoring ASCII case.
///
/// # Examples
///
/// ```
/// use alloc_strategies::StrategyKind;
///
/// let kind: StrategyKind = "calloc".parse().unwrap();
/// assert_eq!(kind, StrategyKind::ZeroedBytes);
/// assert_eq!(kind.to_string(), "zeroed_bytes");
///
/// let block = kind.alloc::<u32>(4).unwrap().unwrap();
///
/// // SAFETY: The block came from the same strategy with the same count.
/// unsafe { kind.free(Some(block), 4) };
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum StrategyKind {
    /// [`NoAlloc`]: every allocation attempt fails.
    NoAlloc,

    /// [`Boxed`]: global allocator, released through `Box`.
    Boxed,

    /// [`RawBytes`]: uninitialized bytes from the global allocator.
    RawBytes,

    /// [`ZeroedBytes`]: zeroed bytes from the global allocator.
    ZeroedBytes,
}

impl StrategyKind {
    /// Every strategy, in declaration order.
    pub const ALL: [Self; 4] = [Self::NoAlloc, Self::Boxed, Self::RawBytes, Self::ZeroedBytes];

    /// The canonical name, as printed by [`Display`][fmt::Display].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NoAlloc => "no_alloc",
            Self::Boxed => "boxed",
            Self::RawBytes => "raw_bytes",
            Self::ZeroedBytes => "zeroed_bytes",
        }
    }

    /// Whether the strategy ever hands out memory.
    #[must_use]
    pub const fn allocates(self) -> bool {
        !matches!(self, Self::NoAlloc)
    }

    /// Whether the backing memory is zeroed before elements are constructed in it.
    #[must_use]
    pub const fn zeroes_memory(self) -> bool {
        matches!(self, Self::ZeroedBytes)
    }

    /// Whether elements are default-initialized on allocation.
    ///
    /// Every strategy that allocates also constructs.
    #[must_use]
    pub const fn constructs(self) -> bool {
        self.allocates()
    }

    /// Allocates and default-initializes `n` elements with the selected strategy.
    ///
    /// Behaves exactly like [`Strategy::alloc`] of the matching strategy type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationProhibited`] for [`StrategyKind::NoAlloc`].
    pub fn alloc<T: Default>(self, n: usize) -> Result<Option<NonNull<T>>> {
        match self {
            Self::NoAlloc => NoAlloc::<T>::alloc(n),
            Self::Boxed => Boxed::<T>::alloc(n),
            Self::RawBytes => RawBytes::<T>::alloc(n),
            Self::ZeroedBytes => ZeroedBytes::<T>::alloc(n),
        }
    }

    /// Finalizes and releases a block obtained from [`alloc()`][Self::alloc].
    ///
    /// # Safety
    ///
    /// The same requirements as [`Strategy::free`] apply: `ptr` must be `None` or the result
    /// of `alloc::<T>(n)` on the same `StrategyKind` with the same `n`, not yet freed.
    pub unsafe fn free<T>(self, ptr: Option<NonNull<T>>, n: usize) {
        match self {
            // SAFETY: Forwarding the caller's guarantees to the matching strategy.
            Self::NoAlloc => unsafe { NoAlloc::<T>::free(ptr, n) },
            // SAFETY: Forwarding the caller's guarantees to the matching strategy.
            Self::Boxed => unsafe { Boxed::<T>::free(ptr, n) },
            // SAFETY: Forwarding the caller's guarantees to the matching strategy.
            Self::RawBytes => unsafe { RawBytes::<T>::free(ptr, n) },
            // SAFETY: Forwarding the caller's guarantees to the matching strategy.
            Self::ZeroedBytes => unsafe { ZeroedBytes::<T>::free(ptr, n) },
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();

        match normalized.as_str() {
            "no_alloc" | "noalloc" => Ok(Self::NoAlloc),
            "boxed" | "new" => Ok(Self::Boxed),
            "raw_bytes" | "malloc" => Ok(Self::RawBytes),
            "zeroed_bytes" | "calloc" => Ok(Self::ZeroedBytes),
            _ => Err(Error::UnknownStrategy {
                name: s.to_string(),
            }),
        }
    }
}
