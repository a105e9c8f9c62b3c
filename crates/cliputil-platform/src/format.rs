//! Portable clipboard format identifiers.
//!
//! The portable space shares its numbering with the standard Win32 formats
//! (1-17). Values outside that range only make sense to the OS that produced
//! them; [`ClipboardFormat::from_native`] maps them to [`ClipboardFormat::UNKNOWN`].

use std::fmt;

/// Tag identifying how a clipboard segment is interpreted.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClipboardFormat(u32);

impl ClipboardFormat {
    /// Wildcard. Only valid for enumeration and existence probes.
    pub const ANY: ClipboardFormat = ClipboardFormat(0);
    /// NUL-terminated 8-bit text.
    pub const TEXT: ClipboardFormat = ClipboardFormat(1);
    pub const BITMAP: ClipboardFormat = ClipboardFormat(2);
    pub const METAFILE_PICT: ClipboardFormat = ClipboardFormat(3);
    pub const SYLK: ClipboardFormat = ClipboardFormat(4);
    pub const DIF: ClipboardFormat = ClipboardFormat(5);
    pub const TIFF: ClipboardFormat = ClipboardFormat(6);
    pub const OEM_TEXT: ClipboardFormat = ClipboardFormat(7);
    pub const DIB: ClipboardFormat = ClipboardFormat(8);
    pub const PALETTE: ClipboardFormat = ClipboardFormat(9);
    pub const PEN_DATA: ClipboardFormat = ClipboardFormat(10);
    pub const RIFF: ClipboardFormat = ClipboardFormat(11);
    pub const WAVE: ClipboardFormat = ClipboardFormat(12);
    /// NUL-terminated UTF-16 text.
    pub const UNICODE_TEXT: ClipboardFormat = ClipboardFormat(13);
    pub const ENH_METAFILE: ClipboardFormat = ClipboardFormat(14);
    /// File drop list.
    pub const HDROP: ClipboardFormat = ClipboardFormat(15);
    pub const LOCALE: ClipboardFormat = ClipboardFormat(16);
    pub const DIB_V5: ClipboardFormat = ClipboardFormat(17);
    /// Native identifier with no portable counterpart.
    pub const UNKNOWN: ClipboardFormat = ClipboardFormat(u32::MAX);

    const LAST_STANDARD: u32 = 17;

    /// Reinterpret a raw identifier without translation.
    ///
    /// Only correct when the caller's identifier space and the portable space
    /// coincide, which holds for Win32 native ids.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Translate a native identifier into the portable space.
    pub const fn from_native(native: u32) -> Self {
        if native >= 1 && native <= Self::LAST_STANDARD {
            Self(native)
        } else {
            Self::UNKNOWN
        }
    }

    pub const fn as_raw(self) -> u32 {
        self.0
    }

    pub const fn is_any(self) -> bool {
        self.0 == Self::ANY.0
    }

    /// True for standard formats with a portable name.
    pub const fn is_standard(self) -> bool {
        self.0 >= 1 && self.0 <= Self::LAST_STANDARD
    }

    /// Human-readable name, `None` for registered or private formats.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::ANY => "ANY",
            Self::TEXT => "TEXT",
            Self::BITMAP => "BITMAP",
            Self::METAFILE_PICT => "METAFILEPICT",
            Self::SYLK => "SYLK",
            Self::DIF => "DIF",
            Self::TIFF => "TIFF",
            Self::OEM_TEXT => "OEMTEXT",
            Self::DIB => "DIB",
            Self::PALETTE => "PALETTE",
            Self::PEN_DATA => "PENDATA",
            Self::RIFF => "RIFF",
            Self::WAVE => "WAVE",
            Self::UNICODE_TEXT => "UNICODETEXT",
            Self::ENH_METAFILE => "ENHMETAFILE",
            Self::HDROP => "HDROP",
            Self::LOCALE => "LOCALE",
            Self::DIB_V5 => "DIBV5",
            Self::UNKNOWN => "UNKNOWN",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Debug for ClipboardFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "ClipboardFormat::{name}"),
            None => write!(f, "ClipboardFormat({:#06x})", self.0),
        }
    }
}

impl fmt::Display for ClipboardFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{:#06x}", self.0),
        }
    }
}

impl From<u32> for ClipboardFormat {
    fn from(raw: u32) -> Self {
        Self::from_raw(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_standard_ids_map_to_themselves() {
        assert_eq!(ClipboardFormat::from_native(1), ClipboardFormat::TEXT);
        assert_eq!(ClipboardFormat::from_native(13), ClipboardFormat::UNICODE_TEXT);
        assert_eq!(ClipboardFormat::from_native(17), ClipboardFormat::DIB_V5);
    }

    #[test]
    fn native_registered_ids_become_unknown() {
        assert_eq!(ClipboardFormat::from_native(0xC0F3), ClipboardFormat::UNKNOWN);
        assert_eq!(ClipboardFormat::from_native(0x0200), ClipboardFormat::UNKNOWN);
        assert_eq!(ClipboardFormat::from_native(0), ClipboardFormat::UNKNOWN);
    }

    #[test]
    fn raw_reinterpretation_keeps_value() {
        assert_eq!(ClipboardFormat::from_raw(0xC0F3).as_raw(), 0xC0F3);
        assert_eq!(ClipboardFormat::from(1), ClipboardFormat::TEXT);
    }

    #[test]
    fn names_and_display() {
        assert_eq!(ClipboardFormat::TEXT.name(), Some("TEXT"));
        assert_eq!(ClipboardFormat::from_raw(0xC0F3).name(), None);
        assert_eq!(ClipboardFormat::HDROP.to_string(), "HDROP");
        assert_eq!(ClipboardFormat::from_raw(0xC0F3).to_string(), "0xc0f3");
    }

    #[test]
    fn wildcard_is_not_standard() {
        assert!(ClipboardFormat::ANY.is_any());
        assert!(!ClipboardFormat::ANY.is_standard());
        assert!(!ClipboardFormat::UNKNOWN.is_standard());
    }
}
