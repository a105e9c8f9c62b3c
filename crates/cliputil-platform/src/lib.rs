//! OS capability boundary for the shared clipboard.
//!
//! Everything above this crate talks to the clipboard through the
//! [`ClipboardBackend`] trait only:
//! - [`WindowsClipboard`] drives the Win32 clipboard and global memory APIs
//! - [`MemoryClipboard`] keeps the whole resource in-process (tests, tooling)
//!
//! This is the lowest layer of cliputil. Memory maps, sessions and the CLI
//! all build on the handle and format types defined here.

pub mod backend;
pub mod error;
pub mod format;
pub mod handle;
pub mod in_memory;

#[cfg(windows)]
pub mod windows;

pub use backend::ClipboardBackend;
pub use error::{PlatformError, Result};
pub use format::ClipboardFormat;
pub use handle::NativeHandle;
pub use in_memory::MemoryClipboard;

#[cfg(windows)]
pub use windows::WindowsClipboard;

/// The backend wired to the real system clipboard on this target.
#[cfg(windows)]
pub type SystemClipboard = WindowsClipboard;

/// Open the system clipboard backend for the current target.
///
/// Returns [`PlatformError::Unsupported`] on targets without a native backend.
pub fn system_clipboard() -> Result<impl ClipboardBackend> {
    #[cfg(windows)]
    {
        Ok(WindowsClipboard::new())
    }

    #[cfg(not(windows))]
    {
        Err::<MemoryClipboard, _>(PlatformError::Unsupported {
            platform: std::env::consts::OS,
        })
    }
}
