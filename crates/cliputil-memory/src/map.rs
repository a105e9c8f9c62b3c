use std::fmt;
use std::ptr::NonNull;

use cliputil_platform::{ClipboardBackend, ClipboardFormat, NativeHandle};
use tracing::{debug, trace, warn};

use crate::guard::{LockGuard, Lockable};

/// One movable clipboard memory block.
///
/// Three facts are tracked independently:
/// - existence: the handle is non-null
/// - lock state: a pointer is cached iff the block is locked
/// - ownership: whether dropping the map must free the block
///
/// Maps opened on published data are borrowed and never freed. Allocated maps
/// are owned until [`submit`](Self::submit) hands them to the OS.
pub struct MemoryMap<'b, B: ClipboardBackend + ?Sized> {
    backend: &'b B,
    handle: NativeHandle,
    pointer: Option<NonNull<u8>>,
    owns_block: bool,
}

impl<'b, B: ClipboardBackend + ?Sized> MemoryMap<'b, B> {
    /// A map with no block behind it.
    pub fn detached(backend: &'b B) -> Self {
        Self {
            backend,
            handle: NativeHandle::NULL,
            pointer: None,
            owns_block: false,
        }
    }

    /// Borrow the block currently published under `format`.
    ///
    /// Returns a detached map when nothing is published. The wildcard format
    /// cannot name a block and is rejected.
    pub fn open_existing(backend: &'b B, format: ClipboardFormat) -> Self {
        if format.is_any() {
            contract_violation!("open_existing() called with the wildcard format");
            return Self::detached(backend);
        }
        let handle = backend.published_block(format);
        trace!(?format, ?handle, "opened published block");
        Self {
            backend,
            handle,
            pointer: None,
            owns_block: false,
        }
    }

    /// Allocate a new block of `size` bytes owned by this map.
    ///
    /// Returns a detached map when the OS refuses the allocation.
    pub fn allocate(backend: &'b B, size: usize, zero_init: bool) -> Self {
        let handle = backend.allocate_movable_block(size, zero_init);
        if handle.is_null() {
            warn!(
                size,
                code = backend.last_error_code(),
                "block allocation failed"
            );
            return Self::detached(backend);
        }
        debug!(size, ?handle, "allocated block");
        Self {
            backend,
            handle,
            pointer: None,
            owns_block: true,
        }
    }

    pub fn exists(&self) -> bool {
        !self.handle.is_null()
    }

    pub fn is_locked(&self) -> bool {
        self.pointer.is_some()
    }

    /// Whether dropping this map frees the block.
    pub fn owns_block(&self) -> bool {
        self.owns_block
    }

    pub fn handle(&self) -> NativeHandle {
        self.handle
    }

    /// Lock the block and return its address.
    ///
    /// Idempotent while locked. Returns `None` and leaves the map unlocked if
    /// the OS refuses.
    pub fn lock(&mut self) -> Option<NonNull<u8>> {
        if !self.exists() {
            contract_violation!("lock() on a memory map without a block");
            return None;
        }
        if let Some(pointer) = self.pointer {
            return Some(pointer);
        }
        match self.backend.lock_block(self.handle) {
            Some(pointer) => {
                trace!(handle = ?self.handle, "block locked");
                self.pointer = Some(pointer);
                Some(pointer)
            }
            None => {
                debug!(
                    handle = ?self.handle,
                    code = self.backend.last_error_code(),
                    "block lock refused"
                );
                None
            }
        }
    }

    /// Unlock the block, given the pointer [`lock`](Self::lock) returned.
    ///
    /// Trivially succeeds when already unlocked.
    pub fn unlock(&mut self, expected: NonNull<u8>) -> bool {
        if !self.exists() {
            contract_violation!("unlock() on a memory map without a block");
            return false;
        }
        let Some(current) = self.pointer else {
            return true;
        };
        if current != expected {
            contract_violation!(
                "unlock() with pointer {:p} not handed out by this map",
                expected
            );
            return false;
        }
        self.release_lock()
    }

    fn release_lock(&mut self) -> bool {
        if self.backend.unlock_block(self.handle) {
            trace!(handle = ?self.handle, "block unlocked");
            self.pointer = None;
            true
        } else {
            warn!(
                handle = ?self.handle,
                code = self.backend.last_error_code(),
                "block unlock refused"
            );
            false
        }
    }

    /// Block size reported by the OS, 0 without a block.
    pub fn size(&self) -> usize {
        if !self.exists() {
            return 0;
        }
        self.backend.block_size(self.handle)
    }

    /// Length of the NUL-terminated run at the start of the block.
    ///
    /// Bounded by [`size`](Self::size). Locks temporarily if needed and only
    /// ever releases the lock it took itself.
    pub fn text_length(&mut self) -> usize {
        if !self.exists() {
            return 0;
        }
        if self.is_locked() {
            return self.terminated_bytes().map(<[u8]>::len).unwrap_or(0);
        }
        match LockGuard::try_acquire(self) {
            Ok(view) => {
                let len = view.terminated_bytes().map(<[u8]>::len).unwrap_or(0);
                drop(view);
                len
            }
            Err(err) => {
                debug!(%err, "text_length could not lock block");
                0
            }
        }
    }

    /// The whole block, while locked.
    pub fn bytes(&self) -> Option<&[u8]> {
        let pointer = self.pointer?;
        let len = self.size();
        // SAFETY: the block is locked, so the OS keeps `len` bytes addressable
        // at `pointer` until we unlock, which needs `&mut self`.
        Some(unsafe { std::slice::from_raw_parts(pointer.as_ptr(), len) })
    }

    /// The bytes before the first NUL (or the whole block), while locked.
    pub fn terminated_bytes(&self) -> Option<&[u8]> {
        let bytes = self.bytes()?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Some(&bytes[..end])
    }

    /// The whole block for writing, while locked. Borrowed blocks are read-only.
    pub fn bytes_mut(&mut self) -> Option<&mut [u8]> {
        if !self.owns_block {
            return None;
        }
        let pointer = self.pointer?;
        let len = self.size();
        // SAFETY: as in `bytes`; the block is private to this map until submitted.
        Some(unsafe { std::slice::from_raw_parts_mut(pointer.as_ptr(), len) })
    }

    /// Publish the block under `format`.
    ///
    /// On success the OS owns the block and this map will not free it. On
    /// failure the map keeps ownership.
    pub fn submit(&mut self, format: ClipboardFormat) -> bool {
        if !self.exists() || format.is_any() {
            return false;
        }
        if !self.owns_block {
            contract_violation!("submit() on a block this map does not own");
            return false;
        }
        if self.is_locked() {
            contract_violation!("submit() while the block is still locked");
            self.release_lock();
        }
        if self.backend.publish_block(format, self.handle) {
            debug!(?format, handle = ?self.handle, "block submitted");
            self.owns_block = false;
            true
        } else {
            warn!(
                ?format,
                code = self.backend.last_error_code(),
                "block submission rejected"
            );
            false
        }
    }
}

impl<B: ClipboardBackend + ?Sized> Lockable for MemoryMap<'_, B> {
    type Token = NonNull<u8>;

    fn lock(&mut self) -> Option<NonNull<u8>> {
        MemoryMap::lock(self)
    }

    fn unlock(&mut self, token: NonNull<u8>) -> bool {
        MemoryMap::unlock(self, token)
    }
}

impl<B: ClipboardBackend + ?Sized> Drop for MemoryMap<'_, B> {
    fn drop(&mut self) {
        if self.is_locked() {
            self.release_lock();
        }
        if self.owns_block && self.exists() && !self.backend.free_block(self.handle) {
            warn!(
                handle = ?self.handle,
                code = self.backend.last_error_code(),
                "failed to free owned block"
            );
        }
    }
}

impl<B: ClipboardBackend + ?Sized> fmt::Debug for MemoryMap<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryMap")
            .field("handle", &self.handle)
            .field("locked", &self.is_locked())
            .field("owns_block", &self.owns_block)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use cliputil_platform::in_memory::{Faults, UNINIT_FILL};
    use cliputil_platform::MemoryClipboard;

    use super::*;

    fn opened(clip: &MemoryClipboard) -> &MemoryClipboard {
        assert!(clip.acquire_exclusive_access(NativeHandle::NULL));
        clip
    }

    #[test]
    fn write_then_submit_transfers_ownership() {
        let clip = MemoryClipboard::new();
        let backend = opened(&clip);
        {
            let mut map = MemoryMap::allocate(backend, 6, true);
            assert!(map.owns_block());
            {
                let mut view = LockGuard::acquire(&mut map);
                view.bytes_mut().unwrap()[..5].copy_from_slice(b"hello");
            }
            assert!(!map.is_locked());
            assert!(map.submit(ClipboardFormat::TEXT));
            assert!(!map.owns_block());
        }
        let stats = clip.stats();
        assert_eq!(stats.frees, 0);
        assert_eq!(stats.live_blocks, 1);
        assert_eq!(clip.contents(ClipboardFormat::TEXT).unwrap(), b"hello\0");
    }

    #[test]
    fn unsubmitted_block_is_freed_on_drop() {
        let clip = MemoryClipboard::new();
        drop(MemoryMap::allocate(&clip, 16, false));
        assert_eq!(clip.stats().frees, 1);
        assert_eq!(clip.stats().live_blocks, 0);
    }

    #[test]
    fn rejected_submit_keeps_ownership() {
        let clip = MemoryClipboard::new();
        let backend = opened(&clip);
        clip.set_faults(Faults {
            reject_publish: true,
            ..Faults::default()
        });
        {
            let mut map = MemoryMap::allocate(backend, 4, true);
            assert!(!map.submit(ClipboardFormat::TEXT));
            assert!(map.owns_block());
        }
        assert_eq!(clip.stats().frees, 1);
    }

    #[test]
    fn never_written_block_still_submits() {
        let clip = MemoryClipboard::new();
        let mut map = MemoryMap::allocate(opened(&clip), 3, false);
        assert!(map.submit(ClipboardFormat::TEXT));
        assert!(!map.owns_block());
        drop(map);
        assert_eq!(
            clip.contents(ClipboardFormat::TEXT).unwrap(),
            vec![UNINIT_FILL; 3]
        );
    }

    #[test]
    fn lock_is_idempotent() {
        let clip = MemoryClipboard::new();
        let mut map = MemoryMap::allocate(&clip, 8, true);
        let first = map.lock().unwrap();
        let second = map.lock().unwrap();
        assert_eq!(first, second);
        assert_eq!(clip.stats().locked_blocks, 1);
        assert!(map.unlock(first));
        assert_eq!(clip.stats().locked_blocks, 0);
    }

    #[test]
    fn unlock_before_lock_is_harmless() {
        let clip = MemoryClipboard::new();
        let mut map = MemoryMap::allocate(&clip, 8, true);
        assert!(map.unlock(NonNull::dangling()));
        assert!(!map.is_locked());
        let pointer = map.lock().unwrap();
        assert!(map.is_locked());
        assert!(map.unlock(pointer));
    }

    #[test]
    fn refused_lock_leaves_state_unchanged() {
        let clip = MemoryClipboard::new();
        let mut map = MemoryMap::allocate(&clip, 8, true);
        clip.set_faults(Faults {
            fail_locks: true,
            ..Faults::default()
        });
        assert!(map.lock().is_none());
        assert!(!map.is_locked());
        assert!(map.bytes().is_none());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "not handed out by this map")]
    fn unlock_with_foreign_pointer_is_a_contract_violation() {
        let clip = MemoryClipboard::new();
        let mut map = MemoryMap::allocate(&clip, 8, true);
        map.lock().unwrap();
        map.unlock(NonNull::dangling());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "without a block")]
    fn lock_without_block_is_a_contract_violation() {
        let clip = MemoryClipboard::new();
        let mut map = MemoryMap::detached(&clip);
        map.lock();
    }

    #[test]
    fn failed_allocation_is_detached() {
        let clip = MemoryClipboard::new();
        clip.set_faults(Faults {
            fail_allocations: true,
            ..Faults::default()
        });
        let map = MemoryMap::allocate(&clip, 8, true);
        assert!(!map.exists());
        assert!(!map.owns_block());
        assert_eq!(map.size(), 0);
    }

    #[test]
    fn borrowed_block_is_unlocked_but_never_freed() {
        let clip = MemoryClipboard::with_text("shared");
        let backend = opened(&clip);
        {
            let mut map = MemoryMap::open_existing(backend, ClipboardFormat::TEXT);
            assert!(map.exists());
            assert!(!map.owns_block());
            map.lock().unwrap();
            assert!(map.bytes_mut().is_none());
            assert_eq!(map.bytes().unwrap(), b"shared\0");
        }
        let stats = clip.stats();
        assert_eq!(stats.frees, 0);
        assert_eq!(stats.locked_blocks, 0);
        assert_eq!(stats.live_blocks, 1);
    }

    #[test]
    fn missing_format_yields_detached_map() {
        let clip = MemoryClipboard::with_text("x");
        let map = MemoryMap::open_existing(opened(&clip), ClipboardFormat::BITMAP);
        assert!(!map.exists());
        assert_eq!(map.size(), 0);
    }

    #[test]
    fn text_length_releases_its_own_lock() {
        let clip = MemoryClipboard::with_text("Hello world");
        let mut map = MemoryMap::open_existing(opened(&clip), ClipboardFormat::TEXT);
        assert_eq!(map.text_length(), 11);
        assert!(!map.is_locked());
        assert_eq!(clip.stats().locked_blocks, 0);
    }

    #[test]
    fn text_length_keeps_callers_lock() {
        let clip = MemoryClipboard::with_text("abc");
        let mut map = MemoryMap::open_existing(opened(&clip), ClipboardFormat::TEXT);
        let pointer = map.lock().unwrap();
        assert_eq!(map.text_length(), 3);
        assert!(map.is_locked());
        assert!(map.unlock(pointer));
    }

    #[test]
    fn text_length_is_bounded_by_block_size() {
        let clip = MemoryClipboard::new();
        let mut map = MemoryMap::allocate(&clip, 5, false);
        assert_eq!(map.text_length(), 5);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "still locked")]
    fn submit_while_locked_is_a_contract_violation() {
        let clip = MemoryClipboard::new();
        let mut map = MemoryMap::allocate(opened(&clip), 2, true);
        map.lock().unwrap();
        map.submit(ClipboardFormat::TEXT);
    }

    #[test]
    fn submit_without_block_or_with_wildcard_fails() {
        let clip = MemoryClipboard::new();
        let backend = opened(&clip);
        assert!(!MemoryMap::detached(backend).submit(ClipboardFormat::TEXT));
        let mut map = MemoryMap::allocate(backend, 2, true);
        assert!(!map.submit(ClipboardFormat::ANY));
        assert!(map.owns_block());
    }
}
