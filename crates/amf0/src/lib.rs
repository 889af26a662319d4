//! A small AMF0 decoder, enough to read FLV `onMetaData` script tags.
//!
//! ```rust
//! use amf0::{Amf0Decoder, Amf0Value};
//!
//! // "onMetaData" followed by an ECMA array { framerate: 25.0 }
//! let mut bytes = vec![0x02, 0x00, 0x0a];
//! bytes.extend_from_slice(b"onMetaData");
//! bytes.extend_from_slice(&[0x08, 0, 0, 0, 1, 0x00, 0x09]);
//! bytes.extend_from_slice(b"framerate");
//! bytes.push(0x00);
//! bytes.extend_from_slice(&25.0f64.to_be_bytes());
//! bytes.extend_from_slice(&[0x00, 0x00, 0x09]);
//!
//! let mut decoder = Amf0Decoder::new(&bytes);
//! assert_eq!(decoder.decode().unwrap().as_str(), Some("onMetaData"));
//! let metadata = decoder.decode().unwrap();
//! assert_eq!(metadata.get("framerate").and_then(Amf0Value::as_number), Some(25.0));
//! ```
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod decode;
mod define;
mod errors;

pub use crate::decode::Amf0Decoder;
pub use crate::define::{Amf0Marker, Amf0Value};
pub use crate::errors::Amf0ReadError;
