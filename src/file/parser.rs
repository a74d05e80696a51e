//! Low-level byte cursor for decoding PDB symbol streams.
//!
//! This module provides the [`crate::file::parser::Parser`] type, a cursor-based binary data
//! parser designed for reading CodeView symbol records. It offers bounds-checked access to
//! binary data with the primitives the symbol record format needs: little-endian integer reads,
//! zero-terminated and length-prefixed strings, 16-byte identifiers, alignment, and absolute
//! seeking.
//!
//! # Architecture
//!
//! The parser is built around a simple cursor-based model that maintains a position within
//! a byte slice:
//!
//! - **Position tracking** - Maintains current offset for sequential parsing operations
//! - **Bounds checking** - All operations validate data availability before reading
//! - **Type-safe reading** - Strongly typed methods for common data types
//! - **Random seeking** - Symbol records carry explicit end offsets; the framing layer
//!   constantly repositions the cursor to a record's declared end, so [`Parser::seek`]
//!   is a first-class operation rather than an escape hatch
//!
//! # Key Components
//!
//! ## Navigation Methods
//! - [`crate::file::parser::Parser::seek`] - Move to a specific position
//! - [`crate::file::parser::Parser::advance_by`] - Move forward by specified bytes
//! - [`crate::file::parser::Parser::pos`] - Get current position
//! - [`crate::file::parser::Parser::align`] - Align to byte boundaries
//!
//! ## Data Access Methods
//! - [`crate::file::parser::Parser::read_le`] - Read primitive types (little-endian)
//! - [`crate::file::parser::Parser::read_guid`] - Read a 16-byte identifier
//! - [`crate::file::parser::Parser::read_string_utf8`] - Read zero-terminated strings
//! - [`crate::file::parser::Parser::skip_string_utf8`] - Skip zero-terminated strings
//! - [`crate::file::parser::Parser::read_prefixed_string_utf8`] - Read length-prefixed strings
//!
//! # Usage Examples
//!
//! ```rust
//! use pdbscope::Parser;
//!
//! let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
//! let mut parser = Parser::new(&data);
//!
//! // Read sequentially
//! let first = parser.read_le::<u32>()?;
//! assert_eq!(first, 0x04030201);
//!
//! // Seek to a specific position
//! parser.seek(6)?;
//! let last_bytes = parser.read_le::<u16>()?;
//! assert_eq!(last_bytes, 0x0807);
//! # Ok::<(), pdbscope::Error>(())
//! ```

use crate::{
    file::io::{read_le_at, CvIO},
    Result,
};

/// A cursor-based binary data parser for reading CodeView symbol records.
///
/// `Parser` provides bounds-checked, position-tracked reading over an immutable byte
/// range. It is designed for the managed symbol stream of a PDB file, where records
/// are self-framed and parsing relies heavily on jumping to declared end offsets.
///
/// The parser maintains an internal position cursor and validates every read against
/// the underlying buffer length, so malformed or truncated streams surface as
/// [`crate::Error::OutOfBounds`] instead of panics.
///
/// # Examples
///
/// ```rust
/// use pdbscope::Parser;
///
/// let data = [0x4D, 0x44, 0x32, 0x00, 0x04];
/// let mut parser = Parser::new(&data);
///
/// let signature = parser.read_string_utf8()?;
/// assert_eq!(signature, "MD2");
/// let version = parser.read_le::<u8>()?;
/// assert_eq!(version, 4);
/// # Ok::<(), pdbscope::Error>(())
/// ```
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`crate::file::parser::Parser`] from a byte slice.
    ///
    /// # Arguments
    /// * `data` - The byte slice to read from
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the parser has no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there is more data available to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Move the current position to the specified index.
    ///
    /// Seeking to exactly the end of the data is valid; the position then sits one
    /// past the last byte and any subsequent read fails. Record framing relies on
    /// this when the final record's declared end coincides with the stream limit.
    ///
    /// # Arguments
    /// * `pos` - The position to move the cursor to
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the position is beyond the data length.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pdbscope::Parser;
    /// let data = [0x01, 0x02, 0x03, 0x04];
    /// let mut parser = Parser::new(&data);
    ///
    /// parser.seek(2)?;
    /// assert_eq!(parser.pos(), 2);
    /// let value = parser.read_le::<u8>()?;
    /// assert_eq!(value, 0x03);
    /// # Ok::<(), pdbscope::Error>(())
    /// ```
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position = pos;
        Ok(())
    }

    /// Move the position forward by the specified number of bytes.
    ///
    /// # Arguments
    /// * `step` - Amount of bytes to advance
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing by step would exceed the data length.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        if self.position + step > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position += step;
        Ok(())
    }

    /// Get the current position of the parser within the data buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Get access to the underlying data buffer.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data
    }

    /// Peek at the next byte without advancing the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if position is at or beyond the data length.
    pub fn peek_byte(&self) -> Result<u8> {
        if self.position >= self.data.len() {
            return Err(out_of_bounds_error!());
        }
        Ok(self.data[self.position])
    }

    /// Align the position to a specific boundary, relative to the stream base.
    ///
    /// This advances the position to the next multiple of the specified alignment.
    /// Custom metadata items inside OEM records are 4-byte aligned.
    ///
    /// # Arguments
    /// * `alignment` - The boundary to align to (must be a power of 2)
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if aligning would exceed the data length.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pdbscope::Parser;
    /// let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
    /// let mut parser = Parser::new(&data);
    ///
    /// parser.advance_by(1)?; // Position is now 1
    /// parser.align(4)?;      // Align to 4-byte boundary
    /// assert_eq!(parser.pos(), 4);
    /// # Ok::<(), pdbscope::Error>(())
    /// ```
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        let padding = (alignment - (self.position % alignment)) % alignment;
        if self.position + padding > self.data.len() {
            return Err(out_of_bounds_error!());
        }
        self.position += padding;
        Ok(())
    }

    /// Read a type `T` from the current position in little-endian format and advance the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pdbscope::Parser;
    /// let data = [0x01, 0x02, 0x03, 0x04];
    /// let mut parser = Parser::new(&data);
    ///
    /// let value: u16 = parser.read_le()?;
    /// assert_eq!(value, 0x0201); // Little-endian interpretation
    /// assert_eq!(parser.pos(), 2);
    /// # Ok::<(), pdbscope::Error>(())
    /// ```
    pub fn read_le<T: CvIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Read a 16-byte identifier in Windows GUID wire layout and advance the position.
    ///
    /// The first three GUID fields are stored little-endian, the final eight bytes
    /// verbatim. OEM symbol records lead with such an identifier to name their payload.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than 16 bytes remain.
    pub fn read_guid(&mut self) -> Result<uguid::Guid> {
        if self.position + 16 > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&self.data[self.position..self.position + 16]);
        self.position += 16;

        Ok(uguid::Guid::from_bytes(bytes))
    }

    /// Read a zero-terminated UTF-8 string from the current position.
    ///
    /// Advances past the terminating zero byte. A string running to the end of the
    /// buffer without a terminator is accepted; the position then sits at the end.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the bytes are not valid UTF-8.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pdbscope::Parser;
    /// let data = b"MD2\0rest";
    /// let mut parser = Parser::new(data);
    ///
    /// assert_eq!(parser.read_string_utf8()?, "MD2");
    /// assert_eq!(parser.pos(), 4);
    /// # Ok::<(), pdbscope::Error>(())
    /// ```
    pub fn read_string_utf8(&mut self) -> Result<String> {
        let start = self.position;
        let mut end = start;

        while end < self.data.len() && self.data[end] != 0 {
            end += 1;
        }

        let string_data = &self.data[start..end];

        if end < self.data.len() {
            self.position = end + 1;
        } else {
            self.position = end;
        }

        String::from_utf8(string_data.to_vec()).map_err(|e| {
            malformed_error!(
                "Invalid UTF-8 string at offset {}-{}: {}",
                start,
                end,
                e.utf8_error()
            )
        })
    }

    /// Skip a zero-terminated string without materializing it.
    ///
    /// Used when the caller asked for names not to be read; the cursor still has to
    /// move past the string bytes to stay on the record grid.
    pub fn skip_string_utf8(&mut self) {
        let mut end = self.position;

        while end < self.data.len() && self.data[end] != 0 {
            end += 1;
        }

        if end < self.data.len() {
            self.position = end + 1;
        } else {
            self.position = end;
        }
    }

    /// Read a length-prefixed UTF-8 string and advance the position.
    ///
    /// The prefix is a little-endian `u16` byte count, followed by that many bytes
    /// of string data. Forward-iterator class names in custom metadata use this shape.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the declared length exceeds the remaining
    /// data, or [`crate::Error::Malformed`] if the bytes are not valid UTF-8.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pdbscope::Parser;
    /// let data = [0x03, 0x00, b'a', b'b', b'c'];
    /// let mut parser = Parser::new(&data);
    ///
    /// assert_eq!(parser.read_prefixed_string_utf8()?, "abc");
    /// assert_eq!(parser.pos(), 5);
    /// # Ok::<(), pdbscope::Error>(())
    /// ```
    pub fn read_prefixed_string_utf8(&mut self) -> Result<String> {
        let length = self.read_le::<u16>()? as usize;
        if self.position + length > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        let start = self.position;
        let string_data = &self.data[start..start + length];
        self.position += length;

        String::from_utf8(string_data.to_vec()).map_err(|e| {
            malformed_error!(
                "Invalid UTF-8 string at offset {}-{}: {}",
                start,
                start + length,
                e.utf8_error()
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_le_sequential() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let mut parser = Parser::new(&data);

        assert_eq!(parser.read_le::<u16>().unwrap(), 0x0201);
        assert_eq!(parser.read_le::<u16>().unwrap(), 0x0403);
        assert_eq!(parser.read_le::<u32>().unwrap(), 0x0807_0605);
        assert!(!parser.has_more_data());
        assert!(parser.read_le::<u8>().is_err());
    }

    #[test]
    fn seek_to_end_is_valid() {
        let data = [0x01, 0x02];
        let mut parser = Parser::new(&data);

        assert!(parser.seek(2).is_ok());
        assert!(!parser.has_more_data());
        assert!(parser.seek(3).is_err());
    }

    #[test]
    fn align_advances_to_boundary() {
        let data = [0u8; 12];
        let mut parser = Parser::new(&data);

        parser.seek(5).unwrap();
        parser.align(4).unwrap();
        assert_eq!(parser.pos(), 8);

        // Already aligned positions stay put
        parser.align(4).unwrap();
        assert_eq!(parser.pos(), 8);
    }

    #[test]
    fn align_out_of_bounds() {
        let data = [0u8; 5];
        let mut parser = Parser::new(&data);

        parser.seek(5).unwrap();
        assert!(parser.align(4).is_err());
    }

    #[test]
    fn read_string_terminated() {
        let data = b"hello\0world\0";
        let mut parser = Parser::new(data);

        assert_eq!(parser.read_string_utf8().unwrap(), "hello");
        assert_eq!(parser.pos(), 6);
        assert_eq!(parser.read_string_utf8().unwrap(), "world");
        assert_eq!(parser.pos(), 12);
    }

    #[test]
    fn read_string_unterminated() {
        let data = b"tail";
        let mut parser = Parser::new(data);

        assert_eq!(parser.read_string_utf8().unwrap(), "tail");
        assert_eq!(parser.pos(), 4);
    }

    #[test]
    fn read_string_invalid_utf8() {
        let data = [0xFF, 0xFE, 0x00];
        let mut parser = Parser::new(&data);

        assert!(parser.read_string_utf8().is_err());
    }

    #[test]
    fn skip_string_advances_like_read() {
        let data = b"hello\0next";
        let mut parser = Parser::new(data);

        parser.skip_string_utf8();
        assert_eq!(parser.pos(), 6);
    }

    #[test]
    fn read_prefixed_string() {
        let data = [0x03, 0x00, b'f', b'o', b'o', 0xAA];
        let mut parser = Parser::new(&data);

        assert_eq!(parser.read_prefixed_string_utf8().unwrap(), "foo");
        assert_eq!(parser.pos(), 5);
    }

    #[test]
    fn read_prefixed_string_truncated() {
        let data = [0x05, 0x00, b'f'];
        let mut parser = Parser::new(&data);

        assert!(parser.read_prefixed_string_utf8().is_err());
    }

    #[test]
    fn read_guid_roundtrip() {
        let expected = uguid::guid!("c6ea3fc9-59b3-49d6-bc25-0902bbabb460");
        let mut data = expected.to_bytes().to_vec();
        data.push(0x42);

        let mut parser = Parser::new(&data);
        assert_eq!(parser.read_guid().unwrap(), expected);
        assert_eq!(parser.pos(), 16);
        assert_eq!(parser.read_le::<u8>().unwrap(), 0x42);
    }

    #[test]
    fn read_guid_truncated() {
        let data = [0u8; 15];
        let mut parser = Parser::new(&data);

        assert!(parser.read_guid().is_err());
        assert_eq!(parser.pos(), 0);
    }
}
