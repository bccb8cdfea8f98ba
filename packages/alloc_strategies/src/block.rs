use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::slice;

use crate::{Error, Result, Strategy};

/// Owns one block of default-initialized elements allocated by the strategy `S`.
///
/// The block is finalized and released through [`Strategy::free`] exactly once, when the
/// handle is dropped. The elements are reachable as a slice via [`Deref`] and [`DerefMut`].
///
/// An empty block (`n == 0`) owns no memory.
///
/// # Examples
///
/// ```
/// use alloc_strategies::{Block, Error, NoAlloc, ZeroedBytes};
///
/// let mut counters = Block::<ZeroedBytes<u32>>::new(4).unwrap();
/// counters[1] += 10;
/// assert_eq!(counters.as_slice(), [0, 10, 0, 0]);
///
/// // The forbidding strategy keeps the same call site but refuses to allocate.
/// let refused = Block::<NoAlloc<u32>>::new(4);
/// assert!(matches!(refused, Err(Error::AllocationProhibited { .. })));
/// ```
///
/// # Thread safety
///
/// The block is [`Send`] if `T` is [`Send`] and [`Sync`] if `T` is [`Sync`], like any other
/// uniquely owned container.
pub struct Block<S: Strategy> {
    ptr: Option<NonNull<S::Val>>,
    len: usize,

    _strategy: PhantomData<S>,
}

impl<S: Strategy> Block<S> {
    /// Allocates a block of `n` default-initialized elements.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationProhibited`] if the strategy forbids allocation and
    /// [`Error::AllocationExhausted`] if the backing memory could not be reserved.
    pub fn new(n: usize) -> Result<Self>
    where
        S::Val: Default,
    {
        let ptr = S::alloc(n)?;

        if ptr.is_none() && n != 0 {
            return Err(Error::AllocationExhausted {
                count: n,
                element: type_name::<S::Val>(),
            });
        }

        Ok(Self {
            ptr,
            len: n,
            _strategy: PhantomData,
        })
    }

    /// Takes ownership of a block previously allocated by `S`.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `ptr` is `None` with `n == 0`, or was returned by
    /// `S::alloc(n)` with the same `n` and is not freed or owned by anyone else.
    #[must_use]
    pub unsafe fn from_raw(ptr: Option<NonNull<S::Val>>, n: usize) -> Self {
        Self {
            ptr,
            len: n,
            _strategy: PhantomData,
        }
    }

    /// Gives up ownership, returning the pointer and count to pass to [`Strategy::free`] later.
    #[must_use]
    pub fn into_raw(self) -> (Option<NonNull<S::Val>>, usize) {
        let this = ManuallyDrop::new(self);
        (this.ptr, this.len)
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
    pub fn as_ptr(&self) -> Option<NonNull<S::Val>> {
        self.ptr
    }

    /// The elements as a shared slice.
    #[must_use]
    pub fn as_slice(&self) -> &[S::Val] {
        match self.ptr {
            // SAFETY: The block owns `len` live elements at `ptr` and we hold a shared borrow.
            Some(ptr) => unsafe { slice::from_raw_parts(ptr.as_ptr(), self.len) },
            None => &[],
        }
    }

    /// The elements as an exclusive slice.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [S::Val] {
        match self.ptr {
            // SAFETY: The block owns `len` live elements at `ptr` and we hold an exclusive borrow.
            Some(ptr) => unsafe { slice::from_raw_parts_mut(ptr.as_ptr(), self.len) },
            None => &mut [],
        }
    }
}

impl<S: Strategy> Deref for Block<S> {
    type Target = [S::Val];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<S: Strategy> DerefMut for Block<S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<S: Strategy> Drop for Block<S> {
    fn drop(&mut self) {
        // SAFETY: The block was produced by S::alloc(len) (or handed over via from_raw() with
        // the same guarantee) and Drop runs only once.
        unsafe {
            S::free(self.ptr, self.len);
        }
    }
}

impl<S: Strategy> fmt::Debug for Block<S>
where
    S::Val: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("strategy", &S::KIND)
            .field("items", &self.as_slice())
            .finish()
    }
}

// SAFETY: The block uniquely owns its elements, so moving it to another thread moves the
// elements, which is fine when they are Send. Strategies are stateless.
unsafe impl<S: Strategy> Send for Block<S> where S::Val: Send {}

// SAFETY: Shared access to the block only hands out shared references to the elements.
unsafe impl<S: Strategy> Sync for Block<S> where S::Val: Sync {}
