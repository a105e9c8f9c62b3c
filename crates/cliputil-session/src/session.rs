use std::fmt;
use std::thread;
use std::time::Instant;

use bytes::Bytes;
use cliputil_memory::{contract_violation, LockGuard, MemoryMap};
use cliputil_platform::{ClipboardBackend, ClipboardFormat, NativeHandle};
use tracing::{debug, trace, warn};

use crate::codec::{self, ClipValue, ValueKind};
use crate::config::SessionConfig;
use crate::enumerator::{FormatEnumerator, Formats};
use crate::error::{CodecError, Result, SessionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Closed,
    Open,
}

/// An exclusive-access window over the clipboard.
///
/// Every data operation is gated on [`SessionState::Open`]; while closed they
/// return `false`, an empty value or zero without touching the backend.
/// Dropping an open session closes it.
pub struct ClipboardSession<B: ClipboardBackend> {
    backend: B,
    owner: NativeHandle,
    state: SessionState,
    config: SessionConfig,
}

impl<B: ClipboardBackend> ClipboardSession<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, SessionConfig::default())
    }

    pub fn with_config(backend: B, config: SessionConfig) -> Self {
        Self {
            backend,
            owner: NativeHandle::NULL,
            state: SessionState::Closed,
            config,
        }
    }

    /// Acquire access on behalf of `owner` instead of anonymously.
    pub fn with_owner(mut self, owner: NativeHandle) -> Self {
        self.owner = owner;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn owner(&self) -> NativeHandle {
        self.owner
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    /// Take exclusive access. Succeeds immediately if already open.
    pub fn open(&mut self) -> bool {
        if self.is_open() {
            return true;
        }
        if self.backend.acquire_exclusive_access(self.owner) {
            debug!(backend = self.backend.name(), owner = ?self.owner, "session opened");
            self.state = SessionState::Open;
            true
        } else {
            debug!(
                backend = self.backend.name(),
                code = self.backend.last_error_code(),
                "session open refused"
            );
            false
        }
    }

    /// Open on behalf of `owner`. The owner only changes while closed.
    pub fn open_as(&mut self, owner: NativeHandle) -> bool {
        if !self.is_open() {
            self.owner = owner;
        }
        self.open()
    }

    /// Open, retrying while another process holds the clipboard.
    ///
    /// A zero `open_timeout` makes exactly one attempt.
    pub fn open_with_retry(&mut self) -> Result<()> {
        let timeout = self.config.open_timeout;
        let started = Instant::now();
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            if self.open() {
                return Ok(());
            }
            if timeout.is_zero() {
                return Err(SessionError::AccessDenied {
                    code: self.backend.last_error_code(),
                });
            }
            let elapsed = started.elapsed();
            if elapsed >= timeout {
                warn!(?timeout, attempts, "clipboard stayed busy");
                return Err(SessionError::Timeout { timeout, attempts });
            }
            thread::sleep(self.config.retry_interval.min(timeout - elapsed));
        }
    }

    /// Give exclusive access back. Succeeds immediately if already closed.
    pub fn close(&mut self) -> bool {
        if !self.is_open() {
            return true;
        }
        if self.backend.release_exclusive_access() {
            debug!(backend = self.backend.name(), "session closed");
            self.state = SessionState::Closed;
            true
        } else {
            warn!(
                backend = self.backend.name(),
                code = self.backend.last_error_code(),
                "session close refused"
            );
            false
        }
    }

    /// Borrowed map over the block published under `format`.
    ///
    /// Detached while closed or when nothing is published.
    pub fn context(&self, format: ClipboardFormat) -> MemoryMap<'_, B> {
        if !self.is_open() {
            return MemoryMap::detached(&self.backend);
        }
        MemoryMap::open_existing(&self.backend, format)
    }

    /// Published text up to its terminator. Invalid UTF-8 is replaced.
    pub fn read_text(&self) -> String {
        let mut map = self.context(ClipboardFormat::TEXT);
        if !map.exists() {
            return String::new();
        }
        let text = match LockGuard::try_acquire(&mut map) {
            Ok(view) => view
                .terminated_bytes()
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                .unwrap_or_default(),
            Err(err) => {
                debug!(%err, "text block could not be locked");
                String::new()
            }
        };
        text
    }

    /// Publish `data` as NUL-terminated text.
    ///
    /// Does not clear other formats; call [`clear`](Self::clear) first to
    /// replace the whole clipboard.
    pub fn write_text(&mut self, data: &str) -> bool {
        if !self.is_open() {
            return false;
        }
        let mut map = MemoryMap::allocate(&self.backend, data.len() + 1, true);
        if !map.exists() {
            return false;
        }
        if !fill(&mut map, 0, data.as_bytes()) {
            return false;
        }
        map.submit(ClipboardFormat::TEXT)
    }

    /// Copy `buffer.len()` bytes starting at `offset` out of the block
    /// published under `format`.
    pub fn read_raw(&self, format: ClipboardFormat, buffer: &mut [u8], offset: usize) -> bool {
        let mut map = self.context(format);
        if !map.exists() {
            return false;
        }
        let Some(end) = offset.checked_add(buffer.len()) else {
            return false;
        };
        if end > map.size() {
            trace!(?format, end, size = map.size(), "raw read out of bounds");
            return false;
        }
        let Ok(view) = LockGuard::try_acquire(&mut map) else {
            return false;
        };
        let Some(bytes) = view.bytes() else {
            return false;
        };
        buffer.copy_from_slice(&bytes[offset..end]);
        true
    }

    /// Publish `bytes` under `format`, preceded by `offset` zero bytes.
    pub fn write_raw(&mut self, format: ClipboardFormat, bytes: &[u8], offset: usize) -> bool {
        if !self.is_open() {
            return false;
        }
        if format.is_any() {
            contract_violation!("write_raw() called with the wildcard format");
            return false;
        }
        let Some(size) = offset.checked_add(bytes.len()) else {
            return false;
        };
        let mut map = MemoryMap::allocate(&self.backend, size, true);
        if !map.exists() {
            return false;
        }
        if !bytes.is_empty() && !fill(&mut map, offset, bytes) {
            return false;
        }
        map.submit(format)
    }

    /// Owned copy of the whole block published under `format`.
    pub fn read_block(&self, format: ClipboardFormat) -> Bytes {
        let mut map = self.context(format);
        if !map.exists() {
            return Bytes::new();
        }
        let block = match LockGuard::try_acquire(&mut map) {
            Ok(view) => view.bytes().map(Bytes::copy_from_slice).unwrap_or_default(),
            Err(_) => Bytes::new(),
        };
        block
    }

    /// Drop every published format.
    pub fn clear(&mut self) -> bool {
        if !self.is_open() {
            return false;
        }
        let purged = self.backend.purge_all_blocks();
        if purged {
            debug!(backend = self.backend.name(), "clipboard cleared");
        }
        purged
    }

    /// Total size of every published block.
    pub fn size(&self) -> usize {
        if !self.is_open() {
            return 0;
        }
        FormatEnumerator::new(&self.backend)
            .formats(false)
            .map(|format| MemoryMap::open_existing(&self.backend, format).size())
            .sum()
    }

    /// Size of the block published under `format`; `ANY` means all of them.
    pub fn size_of(&self, format: ClipboardFormat) -> usize {
        if format.is_any() {
            return self.size();
        }
        self.context(format).size()
    }

    /// Length of the published text, terminator excluded.
    pub fn text_length(&self) -> usize {
        self.context(ClipboardFormat::TEXT).text_length()
    }

    pub fn enumerate<F>(&self, callback: F) -> usize
    where
        F: FnMut(ClipboardFormat) -> bool,
    {
        if !self.is_open() {
            return 0;
        }
        FormatEnumerator::new(&self.backend).enumerate(
            callback,
            self.config.convert_foreign_formats,
            ClipboardFormat::ANY,
        )
    }

    pub fn formats(&self) -> Formats<'_, B> {
        if !self.is_open() {
            return Formats::exhausted(&self.backend);
        }
        FormatEnumerator::new(&self.backend).formats(self.config.convert_foreign_formats)
    }

    pub fn count(&self) -> usize {
        if !self.is_open() {
            return 0;
        }
        FormatEnumerator::new(&self.backend).count()
    }

    pub fn has_format(&self, format: ClipboardFormat) -> bool {
        if !self.is_open() {
            return false;
        }
        FormatEnumerator::new(&self.backend).has_format(format)
    }

    /// Published text decoded as `kind`.
    pub fn read_value(
        &self,
        kind: ValueKind,
        radix: u32,
    ) -> std::result::Result<ClipValue, CodecError> {
        codec::decode(&self.read_text(), kind, radix)
    }

    pub fn write_value(&mut self, value: &ClipValue) -> bool {
        self.write_text(&value.encode())
    }
}

/// Lock `map`, copy `bytes` in at `offset`, unlock.
fn fill<B: ClipboardBackend + ?Sized>(
    map: &mut MemoryMap<'_, B>,
    offset: usize,
    bytes: &[u8],
) -> bool {
    let mut view = match LockGuard::try_acquire(map) {
        Ok(view) => view,
        Err(err) => {
            warn!(%err, "new block could not be locked");
            return false;
        }
    };
    let Some(block) = view.bytes_mut() else {
        return false;
    };
    let Some(target) = block.get_mut(offset..offset + bytes.len()) else {
        return false;
    };
    target.copy_from_slice(bytes);
    true
}

impl<B: ClipboardBackend> Drop for ClipboardSession<B> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<B: ClipboardBackend> fmt::Debug for ClipboardSession<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClipboardSession")
            .field("backend", &self.backend.name())
            .field("owner", &self.owner)
            .field("state", &self.state)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cliputil_platform::in_memory::{codes, Faults};
    use cliputil_platform::MemoryClipboard;

    use super::*;

    fn open_session(clip: &MemoryClipboard) -> ClipboardSession<&MemoryClipboard> {
        let mut session = ClipboardSession::new(clip);
        assert!(session.open());
        session
    }

    #[test]
    fn hello_world_round_trip() {
        let clip = MemoryClipboard::new();
        {
            let mut session = open_session(&clip);
            assert!(session.clear());
            assert!(session.write_text("Hello world"));
        }
        let session = open_session(&clip);
        assert_eq!(session.read_text(), "Hello world");
        assert_eq!(session.text_length(), 11);
        assert_eq!(session.size_of(ClipboardFormat::TEXT), 12);
    }

    #[test]
    fn raw_blocks_read_back_as_terminated_text() {
        for size in [1usize, 2, 7, 64, 4096] {
            let clip = MemoryClipboard::new();
            let payload: Vec<u8> = (0..size).map(|i| b'a' + (i % 26) as u8).collect();
            {
                let session = open_session(&clip);
                let mut map = MemoryMap::allocate(session.backend(), size, false);
                {
                    let mut view = LockGuard::acquire(&mut map);
                    view.bytes_mut().unwrap().copy_from_slice(&payload);
                }
                assert!(map.submit(ClipboardFormat::TEXT));
            }
            let session = open_session(&clip);
            assert_eq!(session.read_text().as_bytes(), payload.as_slice(), "size {size}");
        }
    }

    #[test]
    fn open_close_open_acquires_once_per_transition() {
        let clip = MemoryClipboard::new();
        let mut session = ClipboardSession::new(&clip);
        assert!(session.open());
        assert!(session.open());
        assert_eq!(clip.stats().acquisitions, 1);
        assert!(session.close());
        assert!(session.close());
        assert_eq!(clip.stats().releases, 1);
        assert!(session.open());
        assert_eq!(session.state(), SessionState::Open);
        assert_eq!(clip.stats().acquisitions, 2);
    }

    #[test]
    fn failed_open_stays_closed() {
        let clip = MemoryClipboard::new();
        clip.set_held_elsewhere(true);
        let mut session = ClipboardSession::new(&clip);
        assert!(!session.open());
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[test]
    fn closed_session_is_neutral() {
        let clip = MemoryClipboard::with_text("private");
        let mut session = ClipboardSession::new(&clip);
        assert_eq!(session.read_text(), "");
        assert!(!session.write_text("x"));
        assert!(!session.write_raw(ClipboardFormat::TEXT, b"x", 0));
        assert!(!session.read_raw(ClipboardFormat::TEXT, &mut [0u8; 1], 0));
        assert!(session.read_block(ClipboardFormat::TEXT).is_empty());
        assert!(!session.clear());
        assert_eq!(session.size(), 0);
        assert_eq!(session.size_of(ClipboardFormat::TEXT), 0);
        assert_eq!(session.text_length(), 0);
        assert_eq!(session.count(), 0);
        assert_eq!(session.enumerate(|_| true), 0);
        assert_eq!(session.formats().count(), 0);
        assert!(!session.has_format(ClipboardFormat::ANY));
        assert!(!session.context(ClipboardFormat::TEXT).exists());
        assert_eq!(clip.stats().acquisitions, 0);
        assert_eq!(clip.contents(ClipboardFormat::TEXT).unwrap(), b"private\0");
    }

    #[test]
    fn drop_closes_open_session() {
        let clip = MemoryClipboard::new();
        {
            let _session = open_session(&clip);
            assert!(clip.is_open());
        }
        assert!(!clip.is_open());
    }

    #[test]
    fn open_as_records_owner() {
        let clip = MemoryClipboard::new();
        let owner = NativeHandle::from_raw(0x42);
        let mut session = ClipboardSession::new(&clip);
        assert!(session.open_as(owner));
        assert_eq!(clip.access_owner(), Some(owner));
        assert!(session.open_as(NativeHandle::from_raw(0x99)));
        assert_eq!(session.owner(), owner);
    }

    #[test]
    fn raw_write_pads_offset_with_zeros() {
        let clip = MemoryClipboard::new();
        let mut session = open_session(&clip);
        assert!(session.write_raw(ClipboardFormat::RIFF, b"data", 3));
        assert_eq!(clip.contents(ClipboardFormat::RIFF).unwrap(), b"\0\0\0data");

        let mut buffer = [0u8; 4];
        assert!(session.read_raw(ClipboardFormat::RIFF, &mut buffer, 3));
        assert_eq!(&buffer, b"data");
        assert!(!session.read_raw(ClipboardFormat::RIFF, &mut buffer, 4));
        assert!(!session.read_raw(ClipboardFormat::WAVE, &mut buffer, 0));
        assert_eq!(
            session.read_block(ClipboardFormat::RIFF).as_ref(),
            b"\0\0\0data"
        );
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "wildcard")]
    fn raw_write_to_wildcard_is_a_contract_violation() {
        let clip = MemoryClipboard::new();
        let mut session = open_session(&clip);
        session.write_raw(ClipboardFormat::ANY, b"x", 0);
    }

    #[test]
    fn size_sums_every_format() {
        let clip = MemoryClipboard::with_text("abc");
        clip.seed(ClipboardFormat::from_raw(0xC123), &[1, 2, 3, 4, 5]);
        let session = open_session(&clip);
        assert_eq!(session.size(), 9);
        assert_eq!(session.size_of(ClipboardFormat::ANY), 9);
    }

    #[test]
    fn enumeration_reports_native_ids_by_default() {
        let clip = MemoryClipboard::with_text("abc");
        clip.seed(ClipboardFormat::from_raw(0xC123), b"x");
        let session = open_session(&clip);
        assert_eq!(session.count(), 2);
        assert!(session.has_format(ClipboardFormat::ANY));
        assert!(session.has_format(ClipboardFormat::TEXT));
        assert_eq!(
            session.formats().collect::<Vec<_>>(),
            vec![ClipboardFormat::TEXT, ClipboardFormat::from_raw(0xC123)]
        );
        let mut visited = 0;
        assert_eq!(
            session.enumerate(|_| {
                visited += 1;
                false
            }),
            1
        );
        assert_eq!(visited, 1);
    }

    #[test]
    fn listed_formats_look_up_their_own_sizes() {
        let clip = MemoryClipboard::with_text("abc");
        clip.seed(ClipboardFormat::from_raw(0xC123), &[1, 2, 3, 4, 5]);
        let session = open_session(&clip);
        let sizes: Vec<usize> = session
            .formats()
            .map(|format| session.size_of(format))
            .collect();
        assert_eq!(sizes, vec![4, 5]);
        assert_eq!(sizes.iter().sum::<usize>(), session.size());
    }

    #[test]
    fn conversion_maps_private_formats_to_unknown() {
        let clip = MemoryClipboard::with_text("abc");
        clip.seed(ClipboardFormat::from_raw(0xC123), b"x");
        let config = SessionConfig {
            convert_foreign_formats: true,
            ..SessionConfig::default()
        };
        let mut session = ClipboardSession::with_config(&clip, config);
        assert!(session.open());
        assert_eq!(
            session.formats().collect::<Vec<_>>(),
            vec![ClipboardFormat::TEXT, ClipboardFormat::UNKNOWN]
        );
        let mut seen = Vec::new();
        assert_eq!(
            session.enumerate(|format| {
                seen.push(format);
                true
            }),
            2
        );
        assert_eq!(seen[1], ClipboardFormat::UNKNOWN);
    }

    #[test]
    fn refused_locks_read_and_write_nothing() {
        let clip = MemoryClipboard::with_text("locked out");
        let mut session = open_session(&clip);
        clip.set_faults(Faults {
            fail_locks: true,
            ..Faults::default()
        });

        assert_eq!(session.read_text(), "");
        assert!(!session.read_raw(ClipboardFormat::TEXT, &mut [0u8; 4], 0));
        assert!(session.read_block(ClipboardFormat::TEXT).is_empty());
        assert!(!session.write_text("replacement"));
        assert!(!session.write_raw(ClipboardFormat::RIFF, b"data", 0));

        clip.set_faults(Faults::default());
        assert_eq!(clip.stats().live_blocks, 1);
        assert_eq!(clip.stats().locked_blocks, 0);
        assert_eq!(session.read_text(), "locked out");
    }

    #[test]
    fn refused_lock_frees_the_new_text_block() {
        let clip = MemoryClipboard::new();
        let mut session = open_session(&clip);
        clip.set_faults(Faults {
            fail_locks: true,
            ..Faults::default()
        });
        assert!(!session.write_text("nope"));
        let stats = clip.stats();
        assert_eq!(stats.live_blocks, 0);
        assert_eq!(stats.allocations, stats.frees);
        assert!(!session.has_format(ClipboardFormat::TEXT));
    }

    #[test]
    fn empty_clipboard_counts_zero() {
        let clip = MemoryClipboard::new();
        let session = open_session(&clip);
        assert_eq!(session.count(), 0);
        assert!(!session.has_format(ClipboardFormat::ANY));
        assert_eq!(session.read_text(), "");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let clip = MemoryClipboard::new();
        clip.seed(ClipboardFormat::TEXT, &[b'o', b'k', 0xFF, 0]);
        let session = open_session(&clip);
        assert_eq!(session.read_text(), "ok\u{FFFD}");
    }

    #[test]
    fn write_failures_are_reported_and_leak_nothing() {
        let clip = MemoryClipboard::new();
        let mut session = open_session(&clip);
        clip.set_faults(Faults {
            fail_allocations: true,
            ..Faults::default()
        });
        assert!(!session.write_text("nope"));

        clip.set_faults(Faults {
            reject_publish: true,
            ..Faults::default()
        });
        assert!(!session.write_text("nope"));
        clip.set_faults(Faults::default());
        assert_eq!(clip.stats().live_blocks, 0);
        assert_eq!(session.read_text(), "");
    }

    #[test]
    fn values_round_trip_through_text() {
        let clip = MemoryClipboard::new();
        let mut session = open_session(&clip);
        assert!(session.write_value(&ClipValue::Integer(-255)));
        assert_eq!(
            session.read_value(ValueKind::Integer, 10).unwrap(),
            ClipValue::Integer(-255)
        );
        assert!(session.write_text("not a number"));
        assert!(session.read_value(ValueKind::Float, 10).is_err());
    }

    #[test]
    fn bounded_retry_times_out() {
        let clip = MemoryClipboard::new();
        clip.set_held_elsewhere(true);
        let config = SessionConfig {
            open_timeout: Duration::from_millis(30),
            retry_interval: Duration::from_millis(5),
            ..SessionConfig::default()
        };
        let mut session = ClipboardSession::with_config(&clip, config);
        match session.open_with_retry() {
            Err(SessionError::Timeout { timeout, attempts }) => {
                assert_eq!(timeout, Duration::from_millis(30));
                assert!(attempts >= 2, "attempts = {attempts}");
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        assert!(!session.is_open());
    }

    #[test]
    fn zero_timeout_tries_once() {
        let clip = MemoryClipboard::new();
        clip.set_held_elsewhere(true);
        let config = SessionConfig {
            open_timeout: Duration::ZERO,
            ..SessionConfig::default()
        };
        let mut session = ClipboardSession::with_config(&clip, config);
        match session.open_with_retry() {
            Err(SessionError::AccessDenied { code }) => assert_eq!(code, codes::ACCESS_DENIED),
            other => panic!("expected access denied, got {other:?}"),
        }
        assert_eq!(clip.stats().acquisitions, 1);
    }

    #[test]
    fn retry_succeeds_when_free() {
        let clip = MemoryClipboard::new();
        let mut session = ClipboardSession::new(&clip);
        session.open_with_retry().unwrap();
        assert!(session.is_open());
    }
}
