//! Low-level byte order and safe reading utilities for CodeView symbol parsing.
//!
//! This module provides endian-aware binary data reading functionality for parsing
//! the records of a PDB symbol stream. It implements safe, bounds-checked operations for
//! reading primitive types from byte buffers, preventing buffer overruns during analysis
//! of untrusted debug information.
//!
//! # Architecture
//!
//! The module is built around the [`crate::file::io::CvIO`] trait which provides a unified
//! interface for reading binary data in a type-safe manner:
//!
//! - Generic trait-based reading for all primitive types
//! - Automatic bounds checking to prevent buffer overruns
//! - Consistent error handling through the [`crate::Result`] type
//!
//! CodeView records are always little-endian, so only little-endian readers are provided.
//!
//! # Key Components
//!
//! - [`crate::file::io::CvIO`] - Trait defining reading capabilities for primitive types
//! - [`crate::file::io::read_le`] - Read values from buffer start
//! - [`crate::file::io::read_le_at`] - Read values at a specific offset with auto-advance
//!
//! ## Supported Types
//!
//! The [`crate::file::io::CvIO`] trait is implemented for:
//! - **Unsigned integers**: `u8`, `u16`, `u32`, `u64`
//! - **Signed integers**: `i8`, `i16`, `i32`, `i64`
//! - **Floating point**: `f32`, `f64`
//!
//! # Usage Examples
//!
//! ```rust,ignore
//! use pdbscope::file::io::read_le_at;
//!
//! let data = [0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x00, 0x00];
//! let mut offset = 0;
//!
//! let first: u16 = read_le_at(&data, &mut offset)?;  // offset: 0 -> 2
//! let second: u16 = read_le_at(&data, &mut offset)?; // offset: 2 -> 4
//! let third: u32 = read_le_at(&data, &mut offset)?;  // offset: 4 -> 8
//!
//! assert_eq!(first, 1);
//! assert_eq!(second, 2);
//! assert_eq!(third, 3);
//! # Ok::<(), pdbscope::Error>(())
//! ```
//!
//! # Error Handling
//!
//! All reading functions return [`crate::Result<T>`] and will return [`crate::Error::OutOfBounds`]
//! if the requested read would exceed the buffer length.

use crate::{Error::OutOfBounds, Result};

/// Trait for types that can be read from little-endian byte buffers.
///
/// This trait provides a unified interface for reading primitive numeric types
/// from binary data. All implementations perform pure conversions without any
/// shared state, so they are thread-safe by construction.
pub trait CvIO: Sized {
    /// Associated type representing the byte array type for this numeric type.
    ///
    /// This type must be convertible from a byte slice and is used for reading
    /// binary data in little-endian format.
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]>;

    /// Read T from a byte buffer in little-endian
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
}

// Implement CvIO support for u64
impl CvIO for u64 {
    type Bytes = [u8; 8];

    fn from_le_bytes(bytes: Self::Bytes) -> Self {
        u64::from_le_bytes(bytes)
    }
}

// Implement CvIO support for i64
impl CvIO for i64 {
    type Bytes = [u8; 8];

    fn from_le_bytes(bytes: Self::Bytes) -> Self {
        i64::from_le_bytes(bytes)
    }
}

// Implement CvIO support for u32
impl CvIO for u32 {
    type Bytes = [u8; 4];

    fn from_le_bytes(bytes: Self::Bytes) -> Self {
        u32::from_le_bytes(bytes)
    }
}

// Implement CvIO support for i32
impl CvIO for i32 {
    type Bytes = [u8; 4];

    fn from_le_bytes(bytes: Self::Bytes) -> Self {
        i32::from_le_bytes(bytes)
    }
}

// Implement CvIO support for u16
impl CvIO for u16 {
    type Bytes = [u8; 2];

    fn from_le_bytes(bytes: Self::Bytes) -> Self {
        u16::from_le_bytes(bytes)
    }
}

// Implement CvIO support for i16
impl CvIO for i16 {
    type Bytes = [u8; 2];

    fn from_le_bytes(bytes: Self::Bytes) -> Self {
        i16::from_le_bytes(bytes)
    }
}

// Implement CvIO support for u8
impl CvIO for u8 {
    type Bytes = [u8; 1];

    fn from_le_bytes(bytes: Self::Bytes) -> Self {
        bytes[0]
    }
}

// Implement CvIO support for i8
impl CvIO for i8 {
    type Bytes = [u8; 1];

    fn from_le_bytes(bytes: Self::Bytes) -> Self {
        bytes[0] as i8
    }
}

// Implement CvIO support for f32
impl CvIO for f32 {
    type Bytes = [u8; 4];

    fn from_le_bytes(bytes: Self::Bytes) -> Self {
        f32::from_le_bytes(bytes)
    }
}

// Implement CvIO support for f64
impl CvIO for f64 {
    type Bytes = [u8; 8];

    fn from_le_bytes(bytes: Self::Bytes) -> Self {
        f64::from_le_bytes(bytes)
    }
}

/// Read a value of type `T` from the start of the buffer in little-endian format.
///
/// # Arguments
/// * `data` - The byte buffer to read from
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the buffer is smaller than `size_of::<T>()`.
pub fn read_le<T: CvIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0;
    read_le_at(data, &mut offset)
}

/// Read a value of type `T` at the given offset in little-endian format, advancing the offset.
///
/// # Arguments
/// * `data` - The byte buffer to read from
/// * `offset` - The position to read at; advanced by `size_of::<T>()` on success
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the read would exceed the buffer length.
pub fn read_le_at<T: CvIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    if (type_len + *offset) > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..*offset + type_len].try_into() else {
        return Err(OutOfBounds);
    };

    *offset += type_len;

    Ok(T::from_le_bytes(read))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_le_primitives() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        assert_eq!(read_le::<u8>(&data).unwrap(), 0x01);
        assert_eq!(read_le::<u16>(&data).unwrap(), 0x0201);
        assert_eq!(read_le::<u32>(&data).unwrap(), 0x0403_0201);
        assert_eq!(read_le::<u64>(&data).unwrap(), 0x0807_0605_0403_0201);
    }

    #[test]
    fn read_le_signed() {
        let data = [0xFF, 0xFF];
        assert_eq!(read_le::<i8>(&data).unwrap(), -1);
        assert_eq!(read_le::<i16>(&data).unwrap(), -1);
    }

    #[test]
    fn read_le_floats() {
        let data = 1.5f32.to_le_bytes();
        assert_eq!(read_le::<f32>(&data).unwrap(), 1.5);

        let data = 2.25f64.to_le_bytes();
        assert_eq!(read_le::<f64>(&data).unwrap(), 2.25);
    }

    #[test]
    fn read_le_at_advances() {
        let data = [0x01, 0x00, 0x02, 0x00];
        let mut offset = 0;
        assert_eq!(read_le_at::<u16>(&data, &mut offset).unwrap(), 1);
        assert_eq!(offset, 2);
        assert_eq!(read_le_at::<u16>(&data, &mut offset).unwrap(), 2);
        assert_eq!(offset, 4);
    }

    #[test]
    fn read_le_at_out_of_bounds() {
        let data = [0x01, 0x02];
        let mut offset = 1;
        assert!(read_le_at::<u32>(&data, &mut offset).is_err());
        // Offset is untouched on failure
        assert_eq!(offset, 1);
    }
}
