use std::ffi::c_void;
use std::ptr::NonNull;

use tracing::trace;
use windows_sys::Win32::Foundation::{GetLastError, SetLastError, NO_ERROR};
use windows_sys::Win32::System::DataExchange::{
    CloseClipboard, EmptyClipboard, EnumClipboardFormats, GetClipboardData,
    IsClipboardFormatAvailable, OpenClipboard, SetClipboardData,
};
use windows_sys::Win32::System::Memory::{
    GlobalAlloc, GlobalFree, GlobalLock, GlobalSize, GlobalUnlock, GMEM_MOVEABLE, GMEM_ZEROINIT,
};

use crate::backend::ClipboardBackend;
use crate::format::ClipboardFormat;
use crate::handle::NativeHandle;

/// Win32 clipboard backend.
///
/// Blocks are `GMEM_MOVEABLE` global memory objects; handles are passed to
/// and from the OS unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsClipboard {
    _private: (),
}

impl WindowsClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

fn to_raw(handle: NativeHandle) -> *mut c_void {
    handle.as_raw() as *mut c_void
}

fn from_raw(ptr: *mut c_void) -> NativeHandle {
    NativeHandle::from_raw(ptr as usize)
}

impl ClipboardBackend for WindowsClipboard {
    fn name(&self) -> &'static str {
        "win32"
    }

    fn acquire_exclusive_access(&self, owner: NativeHandle) -> bool {
        // SAFETY: a null owner is allowed; non-null owners are window handles
        // supplied by the caller.
        unsafe { OpenClipboard(to_raw(owner)) != 0 }
    }

    fn release_exclusive_access(&self) -> bool {
        // SAFETY: no arguments; fails cleanly when the clipboard is not open.
        unsafe { CloseClipboard() != 0 }
    }

    fn published_block(&self, format: ClipboardFormat) -> NativeHandle {
        // SAFETY: returns null when the format is absent or the clipboard is closed.
        from_raw(unsafe { GetClipboardData(format.as_raw()) })
    }

    fn publish_block(&self, format: ClipboardFormat, handle: NativeHandle) -> bool {
        // SAFETY: `handle` is a movable global block owned by this process;
        // on success the system takes it over.
        let placed = unsafe { SetClipboardData(format.as_raw(), to_raw(handle)) };
        trace!(?format, ?handle, ok = !placed.is_null(), "SetClipboardData");
        !placed.is_null()
    }

    fn purge_all_blocks(&self) -> bool {
        // SAFETY: no arguments; requires the clipboard to be open.
        unsafe { EmptyClipboard() != 0 }
    }

    fn allocate_movable_block(&self, size: usize, zero_init: bool) -> NativeHandle {
        let flags = if zero_init {
            GMEM_MOVEABLE | GMEM_ZEROINIT
        } else {
            GMEM_MOVEABLE
        };
        // SAFETY: plain allocation call; null on failure.
        from_raw(unsafe { GlobalAlloc(flags, size) })
    }

    fn free_block(&self, handle: NativeHandle) -> bool {
        // SAFETY: `handle` is a global block owned by this process.
        unsafe { GlobalFree(to_raw(handle)).is_null() }
    }

    fn lock_block(&self, handle: NativeHandle) -> Option<NonNull<u8>> {
        // SAFETY: `handle` is a global memory handle; null on failure.
        NonNull::new(unsafe { GlobalLock(to_raw(handle)) }.cast::<u8>())
    }

    fn unlock_block(&self, handle: NativeHandle) -> bool {
        // GlobalUnlock returns zero both when the lock count reaches zero and
        // on failure; only the error code tells them apart.
        // SAFETY: `handle` is a global memory handle previously locked.
        unsafe {
            SetLastError(NO_ERROR);
            GlobalUnlock(to_raw(handle)) != 0 || GetLastError() == NO_ERROR
        }
    }

    fn block_size(&self, handle: NativeHandle) -> usize {
        if handle.is_null() {
            return 0;
        }
        // SAFETY: returns zero for invalid handles.
        unsafe { GlobalSize(to_raw(handle)) }
    }

    fn next_format_after(&self, format: ClipboardFormat) -> u32 {
        // SAFETY: zero starts the enumeration; requires the clipboard to be open.
        unsafe { EnumClipboardFormats(format.as_raw()) }
    }

    fn is_format_available(&self, format: ClipboardFormat) -> bool {
        // SAFETY: read-only query; does not require the clipboard to be open.
        unsafe { IsClipboardFormatAvailable(format.as_raw()) != 0 }
    }

    fn last_error_code(&self) -> u32 {
        // SAFETY: thread-local error state.
        unsafe { GetLastError() }
    }
}
