use std::io;

use bytes::Bytes;

/// An [`io::Cursor`] over a [`Bytes`] buffer, enabling zero copy slicing.
pub type BytesCursor = io::Cursor<Bytes>;

/// Zero copy reads on a [`BytesCursor`].
///
/// Slicing a [`Bytes`] only bumps a reference count, so payloads pulled out
/// of a tag body this way never copy memory.
pub trait BytesCursorExt {
    /// Number of unread bytes left in the cursor.
    fn remaining_len(&self) -> usize;

    /// Takes every unread byte, leaving the cursor at its end.
    fn extract_remaining(&mut self) -> Bytes;

    /// Takes the next `size` bytes.
    ///
    /// Fails with [`io::ErrorKind::UnexpectedEof`] without moving the cursor
    /// when fewer than `size` bytes are left.
    fn extract_bytes(&mut self, size: usize) -> io::Result<Bytes>;
}

impl BytesCursorExt for BytesCursor {
    fn remaining_len(&self) -> usize {
        self.get_ref()
            .len()
            .saturating_sub(self.position() as usize)
    }

    fn extract_remaining(&mut self) -> Bytes {
        let size = self.remaining_len();
        self.extract_bytes(size).unwrap_or_default()
    }

    fn extract_bytes(&mut self, size: usize) -> io::Result<Bytes> {
        if size == 0 {
            return Ok(Bytes::new());
        }

        let available = self.remaining_len();
        if size > available {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("need {size} bytes, {available} left"),
            ));
        }

        let start = self.position() as usize;
        let slice = self.get_ref().slice(start..start + size);
        self.set_position((start + size) as u64);

        Ok(slice)
    }
}
