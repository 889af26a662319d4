use std::io;

/// Reads MSB-first bit fields out of a byte slice.
#[derive(Debug)]
#[must_use]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    /// Starts reading at the first bit of `data`.
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    /// Reads `count` bits (at most 32) as an unsigned integer.
    pub fn read_bits(&mut self, count: u8) -> io::Result<u32> {
        if count > 32 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot read {count} bits at once"),
            ));
        }
        if self.bit_pos + count as usize > self.data.len() * 8 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "bit field runs past the end of the buffer",
            ));
        }

        let mut value = 0u32;
        for _ in 0..count {
            let byte = self.data[self.bit_pos / 8];
            let bit = (byte >> (7 - (self.bit_pos % 8))) & 1;
            value = (value << 1) | bit as u32;
            self.bit_pos += 1;
        }

        Ok(value)
    }

    /// Reads a single bit.
    pub fn read_bit(&mut self) -> io::Result<bool> {
        Ok(self.read_bits(1)? == 1)
    }

    /// Number of bits consumed so far.
    #[must_use]
    pub const fn bit_position(&self) -> usize {
        self.bit_pos
    }
}

/// Packs MSB-first bit fields into a byte vector.
#[derive(Debug, Default)]
#[must_use]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_pos: usize,
}

impl BitWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the low `count` bits of `value` (at most 32).
    pub fn write_bits(&mut self, value: u32, count: u8) -> io::Result<()> {
        if count > 32 || (count < 32 && value >> count != 0) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("value {value} does not fit in {count} bits"),
            ));
        }

        for i in (0..count).rev() {
            if self.bit_pos % 8 == 0 {
                self.bytes.push(0);
            }
            if (value >> i) & 1 == 1 {
                let last = self.bytes.len() - 1;
                self.bytes[last] |= 1 << (7 - (self.bit_pos % 8));
            }
            self.bit_pos += 1;
        }

        Ok(())
    }

    /// Pads the last partial byte with zero bits and returns the buffer.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}
