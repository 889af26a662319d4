//! # FLV container support
//!
//! Reading side: [`reader::FlvReader`] gives bounds-checked, seekable access to
//! the input; [`parser::FlvParser::parse_tags`] walks the tag stream and builds
//! a [`tag::TagIndex`] without loading payloads, tolerating truncated and
//! corrupt records.
//!
//! Codec side: [`audio`] and [`video`] decode the per-tag codec headers,
//! [`aac`], [`avc`] and [`hevc`] decode the decoder configuration records that
//! elementary stream outputs need, and [`script`] pulls metadata hints out of
//! `onMetaData`.
//!
//! Writing side: [`writer::FlvWriter`] produces single-stream FLV files.
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]

pub mod aac;
pub mod audio;
pub mod avc;
pub mod error;
pub mod header;
pub mod hevc;
pub mod parser;
pub mod reader;
pub mod script;
pub mod tag;
pub mod video;
pub mod writer;

pub use error::FlvError;
pub use parser::{FlvParser, ParsedFlv};
pub use reader::FlvReader;
pub use tag::{FlvTag, FlvTagHeader, FlvTagType, TagIndex};

/// Size of the fixed FLV file header.
pub const FLV_HEADER_SIZE: usize = 9;
/// Size of the header preceding every tag payload.
pub const FLV_TAG_HEADER_SIZE: usize = 11;
/// Size of the back pointer following every tag.
pub const FLV_PREVIOUS_TAG_SIZE: usize = 4;
