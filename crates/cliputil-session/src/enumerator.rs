use std::iter::FusedIterator;

use cliputil_platform::{ClipboardBackend, ClipboardFormat};
use tracing::{debug, trace};

/// Walks the formats currently published on the clipboard.
///
/// The OS hands out one native id at a time ("the format after X"), starting
/// from the wildcard, and returns 0 once the table is exhausted. A 0 can also
/// mean the call failed; it is always treated as the end, and the error code is
/// only logged.
pub struct FormatEnumerator<'b, B: ClipboardBackend + ?Sized> {
    backend: &'b B,
}

impl<'b, B: ClipboardBackend + ?Sized> FormatEnumerator<'b, B> {
    pub fn new(backend: &'b B) -> Self {
        Self { backend }
    }

    /// Deliver each format to `callback` until it returns `false` or the
    /// table ends. Returns how many formats were delivered, including the one
    /// that stopped the walk.
    pub fn enumerate<F>(
        &self,
        mut callback: F,
        convert: bool,
        start_after: ClipboardFormat,
    ) -> usize
    where
        F: FnMut(ClipboardFormat) -> bool,
    {
        let mut delivered = 0;
        for format in Formats::starting_after(self.backend, convert, start_after) {
            delivered += 1;
            if !callback(format) {
                trace!(?format, delivered, "enumeration stopped by callback");
                break;
            }
        }
        delivered
    }

    /// Lazy iterator over the published formats.
    pub fn formats(&self, convert: bool) -> Formats<'b, B> {
        Formats::starting_after(self.backend, convert, ClipboardFormat::ANY)
    }

    /// Whether `format` is published. `ANY` asks whether anything is.
    pub fn has_format(&self, format: ClipboardFormat) -> bool {
        if format.is_any() {
            return self.enumerate(|_| false, false, ClipboardFormat::ANY) > 0;
        }
        self.backend.is_format_available(format)
    }

    pub fn count(&self) -> usize {
        self.enumerate(|_| true, false, ClipboardFormat::ANY)
    }
}

/// Iterator returned by [`FormatEnumerator::formats`].
///
/// The cursor is the raw native id, so converting a format to the portable
/// space never affects where the walk resumes.
pub struct Formats<'b, B: ClipboardBackend + ?Sized> {
    backend: &'b B,
    cursor: u32,
    convert: bool,
    done: bool,
}

impl<'b, B: ClipboardBackend + ?Sized> Formats<'b, B> {
    fn starting_after(backend: &'b B, convert: bool, start_after: ClipboardFormat) -> Self {
        Self {
            backend,
            cursor: start_after.as_raw(),
            convert,
            done: false,
        }
    }

    /// An iterator that yields nothing.
    pub fn exhausted(backend: &'b B) -> Self {
        Self {
            backend,
            cursor: 0,
            convert: false,
            done: true,
        }
    }
}

impl<B: ClipboardBackend + ?Sized> Iterator for Formats<'_, B> {
    type Item = ClipboardFormat;

    fn next(&mut self) -> Option<ClipboardFormat> {
        if self.done {
            return None;
        }
        let raw = self
            .backend
            .next_format_after(ClipboardFormat::from_raw(self.cursor));
        if raw == 0 {
            self.done = true;
            debug!(
                code = self.backend.last_error_code(),
                "format enumeration reached end"
            );
            return None;
        }
        self.cursor = raw;
        let format = if self.convert {
            ClipboardFormat::from_native(raw)
        } else {
            ClipboardFormat::from_raw(raw)
        };
        trace!(raw, ?format, "enumerated format");
        Some(format)
    }
}

impl<B: ClipboardBackend + ?Sized> FusedIterator for Formats<'_, B> {}
