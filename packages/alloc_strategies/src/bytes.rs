//! Type-erased byte reservation shared by the strategies that allocate.

use std::alloc::{self, Layout};
use std::any::type_name;
use std::ptr::NonNull;

use tracing::debug;

/// Whether reserved bytes are left as they are or zeroed first.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Fill {
    Uninit,
    Zeroed,
}

/// Reserves storage for `n` elements of `T` from the global allocator.
///
/// Returns `None` if the size overflows or the allocator reports failure. Never panics or
/// aborts on failure. Zero-sized requests are served with a dangling, well-aligned pointer
/// because the global allocator must never see them.
pub(crate) fn reserve<T>(n: usize, fill: Fill) -> Option<NonNull<T>> {
    let Ok(layout) = Layout::array::<T>(n) else {
        debug!(
            count = n,
            element = type_name::<T>(),
            "requested block size overflows the address space"
        );
        return None;
    };

    if layout.size() == 0 {
        return Some(NonNull::dangling());
    }

    let ptr = match fill {
        // SAFETY: The layout has a non-zero size, as checked above.
        Fill::Uninit => unsafe { alloc::alloc(layout) },
        // SAFETY: The layout has a non-zero size, as checked above.
        Fill::Zeroed => unsafe { alloc::alloc_zeroed(layout) },
    };

    let Some(ptr) = NonNull::new(ptr) else {
        debug!(
            count = n,
            element = type_name::<T>(),
            bytes = layout.size(),
            "global allocator could not reserve block"
        );
        return None;
    };

    Some(ptr.cast::<T>())
}

/// Returns storage obtained from [`reserve()`] to the global allocator.
///
/// Values stored in the block are not dropped.
///
/// # Safety
///
/// The caller must ensure that `ptr` was returned by `reserve::<T>(n, _)` with the same `n` and
/// has not been released yet.
pub(crate) unsafe fn release<T>(ptr: NonNull<T>, n: usize) {
    let layout =
        Layout::array::<T>(n).expect("layout was valid when the block was reserved with this count");

    if layout.size() == 0 {
        return;
    }

    // SAFETY: Forwarding the caller's guarantee; the layout is identical to the one used by
    // reserve() because it is derived from the same type and count.
    unsafe {
        alloc::dealloc(ptr.as_ptr().cast::<u8>(), layout);
    }
}
