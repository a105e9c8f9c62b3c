use std::ptr::NonNull;
use std::rc::Rc;

use crate::format::ClipboardFormat;
use crate::handle::NativeHandle;

/// Capability boundary over the OS clipboard and its movable memory blocks.
///
/// The clipboard is a process-external global, so every method takes `&self`.
/// Calls report environmental failure the way the OS does: a null handle, a
/// `None` pointer or `false`. Interpreting those results is the caller's job.
pub trait ClipboardBackend {
    /// Short backend name for diagnostics.
    fn name(&self) -> &'static str;

    /// Try to take exclusive access to the clipboard on behalf of `owner`
    /// (null for an anonymous owner).
    fn acquire_exclusive_access(&self, owner: NativeHandle) -> bool;

    /// Give exclusive access back.
    fn release_exclusive_access(&self) -> bool;

    /// Block currently published under `format`, null if none.
    ///
    /// The OS keeps ownership of the returned block.
    fn published_block(&self, format: ClipboardFormat) -> NativeHandle;

    /// Publish `handle` under `format`. On success the OS owns the block.
    fn publish_block(&self, format: ClipboardFormat, handle: NativeHandle) -> bool;

    /// Drop every published segment.
    fn purge_all_blocks(&self) -> bool;

    /// Allocate a movable block of `size` bytes, null on failure.
    fn allocate_movable_block(&self, size: usize, zero_init: bool) -> NativeHandle;

    /// Free a block this process still owns.
    fn free_block(&self, handle: NativeHandle) -> bool;

    /// Pin a block and return its address.
    fn lock_block(&self, handle: NativeHandle) -> Option<NonNull<u8>>;

    /// Undo one [`lock_block`](Self::lock_block). True once the block is unpinned.
    fn unlock_block(&self, handle: NativeHandle) -> bool;

    /// Size of a block in bytes, 0 for null or invalid handles.
    fn block_size(&self, handle: NativeHandle) -> usize;

    /// Native id of the format published after `format`.
    ///
    /// Zero means end of sequence *or* error; check
    /// [`last_error_code`](Self::last_error_code) to tell them apart.
    fn next_format_after(&self, format: ClipboardFormat) -> u32;

    /// Whether a segment is published under `format`, without enumerating.
    fn is_format_available(&self, format: ClipboardFormat) -> bool;

    /// Error code of the last failed call on this thread.
    fn last_error_code(&self) -> u32;
}

macro_rules! forward_backend {
    () => {
        fn name(&self) -> &'static str {
            (**self).name()
        }

        fn acquire_exclusive_access(&self, owner: NativeHandle) -> bool {
            (**self).acquire_exclusive_access(owner)
        }

        fn release_exclusive_access(&self) -> bool {
            (**self).release_exclusive_access()
        }

        fn published_block(&self, format: ClipboardFormat) -> NativeHandle {
            (**self).published_block(format)
        }

        fn publish_block(&self, format: ClipboardFormat, handle: NativeHandle) -> bool {
            (**self).publish_block(format, handle)
        }

        fn purge_all_blocks(&self) -> bool {
            (**self).purge_all_blocks()
        }

        fn allocate_movable_block(&self, size: usize, zero_init: bool) -> NativeHandle {
            (**self).allocate_movable_block(size, zero_init)
        }

        fn free_block(&self, handle: NativeHandle) -> bool {
            (**self).free_block(handle)
        }

        fn lock_block(&self, handle: NativeHandle) -> Option<NonNull<u8>> {
            (**self).lock_block(handle)
        }

        fn unlock_block(&self, handle: NativeHandle) -> bool {
            (**self).unlock_block(handle)
        }

        fn block_size(&self, handle: NativeHandle) -> usize {
            (**self).block_size(handle)
        }

        fn next_format_after(&self, format: ClipboardFormat) -> u32 {
            (**self).next_format_after(format)
        }

        fn is_format_available(&self, format: ClipboardFormat) -> bool {
            (**self).is_format_available(format)
        }

        fn last_error_code(&self) -> u32 {
            (**self).last_error_code()
        }
    };
}

impl<B: ClipboardBackend + ?Sized> ClipboardBackend for &B {
    forward_backend!();
}

impl<B: ClipboardBackend + ?Sized> ClipboardBackend for Rc<B> {
    forward_backend!();
}

impl<B: ClipboardBackend + ?Sized> ClipboardBackend for Box<B> {
    forward_backend!();
}
