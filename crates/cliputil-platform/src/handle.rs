use std::fmt;

/// Opaque OS identifier for a memory block or an owner window.
///
/// The value zero is the null handle. The type carries no ownership: dropping
/// it never releases anything, whoever produced it decides who frees it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NativeHandle(usize);

impl NativeHandle {
    /// The null handle.
    pub const NULL: NativeHandle = NativeHandle(0);

    /// Wrap a raw handle value.
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    /// The raw handle value.
    pub const fn as_raw(self) -> usize {
        self.0
    }

    /// True for the null handle.
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("NativeHandle(null)")
        } else {
            write!(f, "NativeHandle({:#x})", self.0)
        }
    }
}
