use std::io;

use super::define::Amf0Marker;

/// Errors that can occur when decoding AMF0 data.
#[derive(Debug, thiserror::Error)]
pub enum Amf0ReadError {
    /// A marker byte outside the AMF0 marker table.
    #[error("unknown marker: {0}")]
    UnknownMarker(u8),
    /// A known marker this decoder does not handle (references, recordsets, AMF3).
    #[error("unsupported type: {0:?}")]
    UnsupportedType(Amf0Marker),
    /// A string that is not valid UTF-8.
    #[error("string parse error: {0}")]
    StringParseError(#[from] std::str::Utf8Error),
    /// Objects nested deeper than the decoder allows.
    #[error("nesting deeper than {0} levels")]
    NestingTooDeep(usize),
    /// The buffer ended in the middle of a value.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
