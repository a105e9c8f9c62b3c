//! In-process clipboard backend.
//!
//! Mirrors the Win32 contract closely enough to exercise everything above the
//! platform layer without touching the real clipboard: access must be held to
//! read, publish or enumerate, published blocks belong to the "OS", and lock
//! counts are tracked per block. Fault switches simulate a competing process,
//! allocation failure, lock failure and rejected submissions.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ptr::NonNull;

use tracing::trace;

use crate::backend::ClipboardBackend;
use crate::format::ClipboardFormat;
use crate::handle::NativeHandle;

/// Error codes reported through [`ClipboardBackend::last_error_code`].
///
/// Values match their Win32 counterparts.
pub mod codes {
    pub const NO_ERROR: u32 = 0;
    pub const ACCESS_DENIED: u32 = 5;
    pub const INVALID_HANDLE: u32 = 6;
    pub const NOT_ENOUGH_MEMORY: u32 = 8;
    pub const NOT_LOCKED: u32 = 158;
    pub const CLIPBOARD_NOT_OPEN: u32 = 1418;
}

/// Pattern written into blocks allocated without zero-initialisation.
pub const UNINIT_FILL: u8 = 0xCD;

/// Failure switches for [`MemoryClipboard`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Faults {
    /// Another process holds the clipboard; acquisition fails.
    pub held_elsewhere: bool,
    /// Every allocation returns a null handle.
    pub fail_allocations: bool,
    /// Every lock returns no address.
    pub fail_locks: bool,
    /// Every publish is rejected.
    pub reject_publish: bool,
}

/// Call counters, for asserting on side effects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    pub acquisitions: usize,
    pub releases: usize,
    pub allocations: usize,
    pub frees: usize,
    pub publishes: usize,
    pub purges: usize,
    /// Blocks alive right now, published or not.
    pub live_blocks: usize,
    /// Blocks with a non-zero lock count right now.
    pub locked_blocks: usize,
}

struct Block {
    data: NonNull<u8>,
    len: usize,
    locks: u32,
    published: bool,
}

impl Block {
    fn new(size: usize, fill: u8) -> Self {
        let boxed: Box<[u8]> = vec![fill; size].into_boxed_slice();
        let raw = Box::into_raw(boxed) as *mut u8;
        // SAFETY: `Box::into_raw` never returns null, even for empty slices.
        let data = unsafe { NonNull::new_unchecked(raw) };
        Self {
            data,
            len: size,
            locks: 0,
            published: false,
        }
    }

    fn to_vec(&self) -> Vec<u8> {
        // SAFETY: `data` points to `len` initialised bytes owned by this block.
        unsafe { std::slice::from_raw_parts(self.data.as_ptr(), self.len) }.to_vec()
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        let slice = std::ptr::slice_from_raw_parts_mut(self.data.as_ptr(), self.len);
        // SAFETY: `data`/`len` came from `Box::<[u8]>::into_raw` in `Block::new`
        // and are reconstructed exactly once.
        drop(unsafe { Box::from_raw(slice) });
    }
}

#[derive(Default)]
struct State {
    blocks: HashMap<usize, Block>,
    /// Published segments in publication order: (native format, handle).
    published: Vec<(u32, usize)>,
    /// Blocks the OS dropped while a caller still had them locked; freed on
    /// their last unlock.
    retired: HashMap<usize, Block>,
    next_handle: usize,
    access: Option<NativeHandle>,
    faults: Faults,
    last_error: u32,
    stats: MemoryStats,
}

impl State {
    fn fail(&mut self, code: u32) {
        self.last_error = code;
    }

    fn require_access(&mut self) -> bool {
        if self.access.is_none() {
            self.fail(codes::CLIPBOARD_NOT_OPEN);
            return false;
        }
        true
    }

    fn insert_block(&mut self, block: Block) -> NativeHandle {
        self.next_handle += 1;
        let raw = self.next_handle;
        self.blocks.insert(raw, block);
        NativeHandle::from_raw(raw)
    }

    fn block_mut(&mut self, handle: NativeHandle) -> Option<&mut Block> {
        let raw = handle.as_raw();
        if self.blocks.contains_key(&raw) {
            self.blocks.get_mut(&raw)
        } else {
            self.retired.get_mut(&raw)
        }
    }

    /// Drop an OS-owned block, parking it if a caller still has it locked.
    fn discard_published(&mut self, raw: usize) {
        if let Some(block) = self.blocks.remove(&raw) {
            if block.locks > 0 {
                self.retired.insert(raw, block);
            }
        }
    }

    fn unpublish(&mut self, native: u32) {
        if let Some(pos) = self.published.iter().position(|(f, _)| *f == native) {
            let (_, raw) = self.published.remove(pos);
            self.discard_published(raw);
        }
    }
}

/// Clipboard kept entirely in this process.
///
/// Not thread-safe; share it between sessions by reference or `Rc`.
#[derive(Default)]
pub struct MemoryClipboard {
    state: RefCell<State>,
}

impl MemoryClipboard {
    /// Create an empty clipboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clipboard already holding `text` as a NUL-terminated TEXT segment.
    pub fn with_text(text: &str) -> Self {
        let clipboard = Self::new();
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        clipboard.seed(ClipboardFormat::TEXT, &bytes);
        clipboard
    }

    /// Publish `bytes` under `format` as another process would, without
    /// needing exclusive access.
    pub fn seed(&self, format: ClipboardFormat, bytes: &[u8]) {
        let mut state = self.state.borrow_mut();
        let block = Block::new(bytes.len(), 0);
        // SAFETY: the fresh block owns `bytes.len()` writable bytes and nothing
        // else references it yet.
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), block.data.as_ptr(), bytes.len());
        }
        let handle = state.insert_block(block);
        state.unpublish(format.as_raw());
        if let Some(block) = state.blocks.get_mut(&handle.as_raw()) {
            block.published = true;
        }
        state.published.push((format.as_raw(), handle.as_raw()));
    }

    /// Copy of the segment published under `format`.
    pub fn contents(&self, format: ClipboardFormat) -> Option<Vec<u8>> {
        let state = self.state.borrow();
        let (_, raw) = state
            .published
            .iter()
            .find(|(f, _)| *f == format.as_raw())?;
        state.blocks.get(raw).map(Block::to_vec)
    }

    /// Published formats in publication order.
    pub fn published_formats(&self) -> Vec<ClipboardFormat> {
        self.state
            .borrow()
            .published
            .iter()
            .map(|(f, _)| ClipboardFormat::from_raw(*f))
            .collect()
    }

    /// Whether some caller currently holds exclusive access.
    pub fn is_open(&self) -> bool {
        self.state.borrow().access.is_some()
    }

    /// Owner that currently holds exclusive access.
    pub fn access_owner(&self) -> Option<NativeHandle> {
        self.state.borrow().access
    }

    pub fn faults(&self) -> Faults {
        self.state.borrow().faults
    }

    pub fn set_faults(&self, faults: Faults) {
        self.state.borrow_mut().faults = faults;
    }

    /// Simulate another process holding (or letting go of) the clipboard.
    pub fn set_held_elsewhere(&self, held: bool) {
        self.state.borrow_mut().faults.held_elsewhere = held;
    }

    pub fn stats(&self) -> MemoryStats {
        let state = self.state.borrow();
        let live = state.blocks.len() + state.retired.len();
        let locked = state
            .blocks
            .values()
            .chain(state.retired.values())
            .filter(|b| b.locks > 0)
            .count();
        MemoryStats {
            live_blocks: live,
            locked_blocks: locked,
            ..state.stats
        }
    }
}

impl ClipboardBackend for MemoryClipboard {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    fn acquire_exclusive_access(&self, owner: NativeHandle) -> bool {
        let mut state = self.state.borrow_mut();
        state.stats.acquisitions += 1;
        if state.faults.held_elsewhere || state.access.is_some() {
            state.fail(codes::ACCESS_DENIED);
            return false;
        }
        state.access = Some(owner);
        true
    }

    fn release_exclusive_access(&self) -> bool {
        let mut state = self.state.borrow_mut();
        if !state.require_access() {
            return false;
        }
        state.stats.releases += 1;
        state.access = None;
        true
    }

    fn published_block(&self, format: ClipboardFormat) -> NativeHandle {
        let mut state = self.state.borrow_mut();
        if !state.require_access() {
            return NativeHandle::NULL;
        }
        let found = state
            .published
            .iter()
            .find(|(f, _)| *f == format.as_raw())
            .map(|(_, raw)| NativeHandle::from_raw(*raw));
        found.unwrap_or(NativeHandle::NULL)
    }

    fn publish_block(&self, format: ClipboardFormat, handle: NativeHandle) -> bool {
        let mut state = self.state.borrow_mut();
        if !state.require_access() {
            return false;
        }
        if state.faults.reject_publish {
            state.fail(codes::ACCESS_DENIED);
            return false;
        }
        let publishable = matches!(state.blocks.get(&handle.as_raw()), Some(b) if !b.published);
        if !publishable {
            state.fail(codes::INVALID_HANDLE);
            return false;
        }
        state.unpublish(format.as_raw());
        if let Some(block) = state.blocks.get_mut(&handle.as_raw()) {
            block.published = true;
        }
        state.published.push((format.as_raw(), handle.as_raw()));
        state.stats.publishes += 1;
        trace!(?format, ?handle, "block published");
        true
    }

    fn purge_all_blocks(&self) -> bool {
        let mut state = self.state.borrow_mut();
        if !state.require_access() {
            return false;
        }
        let published = std::mem::take(&mut state.published);
        for (_, raw) in published {
            state.discard_published(raw);
        }
        state.stats.purges += 1;
        true
    }

    fn allocate_movable_block(&self, size: usize, zero_init: bool) -> NativeHandle {
        let mut state = self.state.borrow_mut();
        if state.faults.fail_allocations {
            state.fail(codes::NOT_ENOUGH_MEMORY);
            return NativeHandle::NULL;
        }
        let fill = if zero_init { 0 } else { UNINIT_FILL };
        state.stats.allocations += 1;
        state.insert_block(Block::new(size, fill))
    }

    fn free_block(&self, handle: NativeHandle) -> bool {
        let mut state = self.state.borrow_mut();
        let owned = matches!(state.blocks.get(&handle.as_raw()), Some(b) if !b.published);
        if !owned {
            state.fail(codes::INVALID_HANDLE);
            return false;
        }
        state.blocks.remove(&handle.as_raw());
        state.stats.frees += 1;
        true
    }

    fn lock_block(&self, handle: NativeHandle) -> Option<NonNull<u8>> {
        let mut state = self.state.borrow_mut();
        if state.faults.fail_locks {
            state.fail(codes::ACCESS_DENIED);
            return None;
        }
        match state.block_mut(handle) {
            Some(block) => {
                block.locks += 1;
                Some(block.data)
            }
            None => {
                state.fail(codes::INVALID_HANDLE);
                None
            }
        }
    }

    fn unlock_block(&self, handle: NativeHandle) -> bool {
        let mut state = self.state.borrow_mut();
        let raw = handle.as_raw();
        let remaining = match state.block_mut(handle) {
            Some(block) if block.locks > 0 => {
                block.locks -= 1;
                block.locks
            }
            Some(_) => {
                state.fail(codes::NOT_LOCKED);
                return false;
            }
            None => {
                state.fail(codes::INVALID_HANDLE);
                return false;
            }
        };
        if remaining == 0 {
            state.retired.remove(&raw);
        }
        true
    }

    fn block_size(&self, handle: NativeHandle) -> usize {
        let mut state = self.state.borrow_mut();
        match state.block_mut(handle) {
            Some(block) => block.len,
            None => 0,
        }
    }

    fn next_format_after(&self, format: ClipboardFormat) -> u32 {
        let mut state = self.state.borrow_mut();
        if !state.require_access() {
            return 0;
        }
        state.last_error = codes::NO_ERROR;
        let next = if format.is_any() {
            state.published.first()
        } else {
            state
                .published
                .iter()
                .position(|(f, _)| *f == format.as_raw())
                .and_then(|pos| state.published.get(pos + 1))
        };
        next.map(|(f, _)| *f).unwrap_or(0)
    }

    fn is_format_available(&self, format: ClipboardFormat) -> bool {
        if format.is_any() {
            return false;
        }
        self.state
            .borrow()
            .published
            .iter()
            .any(|(f, _)| *f == format.as_raw())
    }

    fn last_error_code(&self) -> u32 {
        self.state.borrow().last_error
    }
}
