//! Safe access to the shared system clipboard.
//!
//! cliputil tracks who owns each OS-shared clipboard block, keeps every lock
//! scoped, and gates all access behind an explicit open/closed session.
//!
//! # Crate Structure
//!
//! - [`platform`]: OS capability boundary (Win32 backend, in-process backend)
//! - [`memory`]: Scoped lock guards and memory block ownership tracking
//! - [`session`]: Clipboard sessions, format enumeration, typed values

/// Re-export platform types.
pub mod platform {
    pub use cliputil_platform::*;
}

/// Re-export memory block types.
pub mod memory {
    pub use cliputil_memory::*;
}

/// Re-export session types.
pub mod session {
    pub use cliputil_session::*;
}

pub use cliputil_platform::{
    system_clipboard, ClipboardBackend, ClipboardFormat, MemoryClipboard,
};
pub use cliputil_session::{ClipboardSession, SessionConfig};
