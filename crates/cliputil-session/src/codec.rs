//! Typed views over clipboard text.
//!
//! A closed set of value kinds. Decoding is strict: the whole trimmed text
//! must parse, otherwise [`CodecError::Parse`] is returned instead of a
//! silent zero.

use std::fmt;

use crate::error::CodecError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Integer,
    Float,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueKind::Text => "text",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClipValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl ClipValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            ClipValue::Text(_) => ValueKind::Text,
            ClipValue::Integer(_) => ValueKind::Integer,
            ClipValue::Float(_) => ValueKind::Float,
        }
    }

    /// Text representation written to the clipboard.
    pub fn encode(&self) -> String {
        match self {
            ClipValue::Text(text) => text.clone(),
            ClipValue::Integer(value) => value.to_string(),
            ClipValue::Float(value) => value.to_string(),
        }
    }
}

impl fmt::Display for ClipValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Decode `text` as `kind`. `radix` only applies to integers.
pub fn decode(text: &str, kind: ValueKind, radix: u32) -> Result<ClipValue, CodecError> {
    match kind {
        ValueKind::Text => Ok(ClipValue::Text(text.to_string())),
        ValueKind::Integer => decode_integer(text, radix).map(ClipValue::Integer),
        ValueKind::Float => {
            let trimmed = text.trim();
            trimmed
                .parse::<f64>()
                .map(ClipValue::Float)
                .map_err(|err| parse_error(kind, text, err.to_string()))
        }
    }
}

fn decode_integer(text: &str, radix: u32) -> Result<i64, CodecError> {
    if !(2..=36).contains(&radix) {
        return Err(CodecError::InvalidRadix(radix));
    }
    let trimmed = text.trim();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits = if radix == 16 {
        unsigned
            .strip_prefix("0x")
            .or_else(|| unsigned.strip_prefix("0X"))
            .unwrap_or(unsigned)
    } else {
        unsigned
    };
    if digits.starts_with(['+', '-']) {
        return Err(parse_error(
            ValueKind::Integer,
            text,
            "misplaced sign".to_string(),
        ));
    }
    // Re-attach the sign so i64::MIN parses.
    let signed = if negative {
        format!("-{digits}")
    } else {
        digits.to_string()
    };
    i64::from_str_radix(&signed, radix)
        .map_err(|err| parse_error(ValueKind::Integer, text, err.to_string()))
}

fn parse_error(kind: ValueKind, input: &str, reason: String) -> CodecError {
    CodecError::Parse {
        kind,
        input: input.to_string(),
        reason,
    }
}
