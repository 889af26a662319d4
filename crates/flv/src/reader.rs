//! Bounds-checked, seekable reader over an FLV input.
//!
//! The parser walks tags sequentially and the demultiplexer later seeks back
//! to copy individual payloads, so the reader keeps track of its own position
//! and the total input length and refuses any read that would run past the
//! end.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use bytes::Bytes;
use bytes_util::{Endianness, read_uint};

use crate::error::FlvError;

pub struct FlvReader<R> {
    inner: R,
    position: u64,
    len: u64,
}

impl FlvReader<BufReader<File>> {
    /// Opens `path` for reading. The file handle is released when the reader
    /// is dropped.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FlvError> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> FlvReader<R> {
    /// Wraps `inner`, measuring its length and rewinding it to the start.
    pub fn new(mut inner: R) -> Result<Self, FlvError> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self {
            inner,
            position: 0,
            len,
        })
    }

    /// Total input length in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Bytes left between the current position and the end of the input.
    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.position)
    }

    /// Moves to an absolute offset. Seeking to exactly the end is allowed.
    pub fn seek(&mut self, offset: u64) -> Result<(), FlvError> {
        if offset > self.len {
            return Err(FlvError::OutOfBounds {
                offset,
                len: self.len,
            });
        }
        if offset != self.position {
            self.inner.seek(SeekFrom::Start(offset))?;
            self.position = offset;
        }
        Ok(())
    }

    /// Skips `count` bytes forward.
    pub fn skip(&mut self, count: u64) -> Result<(), FlvError> {
        self.ensure(count)?;
        self.seek(self.position + count)
    }

    /// Reads an unsigned integer of `size` bytes (1..=8).
    ///
    /// On failure the position is left where it was.
    pub fn read_uint(&mut self, size: usize, endianness: Endianness) -> Result<u64, FlvError> {
        if size == 0 || size > 8 {
            return Err(FlvError::InvalidData(format!(
                "cannot read a {size}-byte integer"
            )));
        }
        self.ensure(size as u64)?;
        let value = read_uint(&mut self.inner, size, endianness)?;
        self.position += size as u64;
        Ok(value)
    }

    pub fn read_u8(&mut self) -> Result<u8, FlvError> {
        Ok(self.read_uint(1, Endianness::Big)? as u8)
    }

    pub fn read_u24_be(&mut self) -> Result<u32, FlvError> {
        Ok(self.read_uint(3, Endianness::Big)? as u32)
    }

    pub fn read_u32_be(&mut self) -> Result<u32, FlvError> {
        Ok(self.read_uint(4, Endianness::Big)? as u32)
    }

    /// Reads exactly `size` bytes.
    pub fn read_bytes(&mut self, size: usize) -> Result<Bytes, FlvError> {
        self.ensure(size as u64)?;
        let mut buffer = vec![0u8; size];
        self.inner.read_exact(&mut buffer)?;
        self.position += size as u64;
        Ok(Bytes::from(buffer))
    }

    /// Reads `size` bytes starting at `offset`, leaving the reader positioned
    /// right after them.
    pub fn read_at(&mut self, offset: u64, size: usize) -> Result<Bytes, FlvError> {
        self.seek(offset)?;
        self.read_bytes(size)
    }

    fn ensure(&self, needed: u64) -> Result<(), FlvError> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(FlvError::TruncatedInput { needed, remaining });
        }
        Ok(())
    }

    /// Returns the wrapped reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R> std::fmt::Debug for FlvReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlvReader")
            .field("position", &self.position)
            .field("len", &self.len)
            .finish()
    }
}

impl From<FlvError> for io::Error {
    fn from(err: FlvError) -> Self {
        match err {
            FlvError::Io(err) => err,
            FlvError::TruncatedInput { .. } => io::Error::new(io::ErrorKind::UnexpectedEof, err),
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
