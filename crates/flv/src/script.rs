//! # FLV Script Module
//!
//! Reads the hints an `onMetaData` script tag carries about the file. Only the
//! fields useful for cross-checking frame timing are kept; everything else in
//! the AMF0 payload is ignored.
//!
//! ## Specifications
//!
//! - [Flash Video File Format Specification v10](https://www.adobe.com/content/dam/acom/en/devnet/flv/video_file_format_spec_v10.pdf)
//! - [Action Message Format -- AMF 0](https://www.adobe.com/content/dam/acom/en/devnet/pdf/amf0-file-format-specification.pdf)

use amf0::{Amf0Decoder, Amf0ReadError, Amf0Value};

pub const ON_METADATA: &str = "onMetaData";

/// Values announced by the muxer. Any of them may be missing or wrong.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataHints {
    pub duration_s: Option<f64>,
    pub frame_rate: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl MetadataHints {
    /// Decodes a script tag payload.
    ///
    /// Returns `Ok(None)` when the tag is not `onMetaData` or its value is not
    /// an object.
    pub fn parse(payload: &[u8]) -> Result<Option<Self>, Amf0ReadError> {
        let mut decoder = Amf0Decoder::new(payload);

        let name = decoder.decode()?;
        if name.as_str() != Some(ON_METADATA) {
            return Ok(None);
        }

        let value = decoder.decode()?;
        if !matches!(value, Amf0Value::Object(_)) {
            return Ok(None);
        }

        let number = |key: &str| {
            value
                .get(key)
                .and_then(Amf0Value::as_number)
                .filter(|n| n.is_finite() && *n > 0.0)
        };

        Ok(Some(Self {
            duration_s: number("duration"),
            frame_rate: number("framerate").or_else(|| number("videoframerate")),
            width: number("width"),
            height: number("height"),
        }))
    }
}
