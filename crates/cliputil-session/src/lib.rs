//! Clipboard access sessions and published-format enumeration.
//!
//! This is the layer a consuming tool talks to. Open a session, read or
//! write text and raw segments, list what other programs published, close.
//! Every accessor returns a neutral value while the session is closed.

pub mod codec;
pub mod config;
pub mod enumerator;
pub mod error;
pub mod session;

pub use codec::{decode, ClipValue, ValueKind};
pub use config::SessionConfig;
pub use enumerator::{FormatEnumerator, Formats};
pub use error::{CodecError, Result, SessionError};
pub use session::{ClipboardSession, SessionState};
