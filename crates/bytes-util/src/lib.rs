//! Helpers for working with bits and bytes.
//!
//! - [`BytesCursorExt`] for zero copy reads out of a [`BytesCursor`]
//! - [`Endianness`] and [`read_uint`] for sized integers of either byte order
//! - [`BitReader`] / [`BitWriter`] for MSB-first bit fields (codec headers)
//! - [`range_check!`] for validating decoded fields
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod bits;
mod bytes_cursor;
mod endian;
mod range_check;

pub use bits::{BitReader, BitWriter};
pub use bytes_cursor::{BytesCursor, BytesCursorExt};
pub use endian::{Endianness, read_uint};
