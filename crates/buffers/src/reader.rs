//! Binary buffer reader with cursor tracking.

use std::str;

use crate::BufferError;

/// A binary buffer reader over a borrowed byte slice.
///
/// The reader maintains a cursor `x` and an exclusive `end`; every read is
/// bounds-checked against `end`, so a reader cut out of a larger buffer never
/// reads past its own window.
///
/// # Example
///
/// ```
/// use twpb_buffers::Reader;
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0x05];
/// let mut reader = Reader::new(&data);
///
/// assert_eq!(reader.try_buf(1), Ok(&[0x01][..]));
/// assert_eq!(reader.try_u32_le(), Ok(0x0504_0302));
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    /// The underlying byte slice.
    pub uint8: &'a [u8],
    /// Current cursor position.
    pub x: usize,
    /// End position (exclusive).
    pub end: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader for the given byte slice.
    pub fn new(uint8: &'a [u8]) -> Self {
        let end = uint8.len();
        Self { uint8, x: 0, end }
    }

    /// Returns the number of remaining bytes.
    pub fn size(&self) -> usize {
        self.end - self.x
    }

    pub fn is_empty(&self) -> bool {
        self.x >= self.end
    }

    /// The unread part of the window, without advancing.
    pub fn remaining(&self) -> &'a [u8] {
        &self.uint8[self.x..self.end]
    }

    /// Bytes consumed between `start` and the current cursor.
    pub fn consumed_since(&self, start: usize) -> &'a [u8] {
        &self.uint8[start.min(self.x)..self.x]
    }

    /// Checks that `n` more bytes are available from the current cursor.
    #[inline]
    fn check(&self, n: usize) -> Result<(), BufferError> {
        if n > self.size() {
            Err(BufferError::EndOfBuffer)
        } else {
            Ok(())
        }
    }

    /// Advances the cursor by `length` bytes.
    pub fn try_skip(&mut self, length: usize) -> Result<(), BufferError> {
        self.check(length)?;
        self.x += length;
        Ok(())
    }

    /// Reads an unsigned 32-bit integer (little-endian).
    #[inline]
    pub fn try_u32_le(&mut self) -> Result<u32, BufferError> {
        self.check(4)?;
        let x = self.x;
        let val = u32::from_le_bytes([
            self.uint8[x],
            self.uint8[x + 1],
            self.uint8[x + 2],
            self.uint8[x + 3],
        ]);
        self.x += 4;
        Ok(val)
    }

    /// Reads an unsigned 64-bit integer (little-endian).
    #[inline]
    pub fn try_u64_le(&mut self) -> Result<u64, BufferError> {
        self.check(8)?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.uint8[self.x..self.x + 8]);
        self.x += 8;
        Ok(u64::from_le_bytes(bytes))
    }

    /// Reads `size` raw bytes and advances the cursor.
    pub fn try_buf(&mut self, size: usize) -> Result<&'a [u8], BufferError> {
        self.check(size)?;
        let x = self.x;
        let end = x + size;
        let bin = &self.uint8[x..end];
        self.x = end;
        Ok(bin)
    }

    /// Reads a UTF-8 string of `size` bytes.
    pub fn try_utf8(&mut self, size: usize) -> Result<&'a str, BufferError> {
        let bin = self.try_buf(size)?;
        str::from_utf8(bin).map_err(|_| BufferError::InvalidUtf8)
    }
}
