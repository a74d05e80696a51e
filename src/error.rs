use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers all failure modes of decoding the managed symbol stream of a PDB file.
/// Each variant provides specific context about the failure mode to enable appropriate
/// error handling.
///
/// # Error Categories
///
/// ## Stream Parsing Errors
/// - [`Error::Malformed`] - Corrupted or invalid record structure
/// - [`Error::OutOfBounds`] - Attempted to read beyond stream boundaries
/// - [`Error::UnsupportedVersion`] - Custom metadata carries an unknown version
/// - [`Error::Empty`] - Empty input provided
///
/// # Examples
///
/// ```rust
/// use pdbscope::{Error, SymbolStream};
///
/// match SymbolStream::new(&[], 0, 0) {
///     Ok(_) => println!("Stream accepted"),
///     Err(Error::Empty) => eprintln!("No data provided"),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("Malformed stream: {} ({}:{})", message, file, line);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The symbol stream is damaged and could not be parsed.
    ///
    /// This error indicates that a record violates a structural invariant the format
    /// guarantees for well-formed input, such as a managed procedure with a nonzero
    /// parent link or a body scan that does not terminate at the declared end offset.
    /// The error includes the source location where the malformation was detected
    /// for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed, including the byte offset
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the stream.
    ///
    /// This error occurs when trying to read data beyond the end of the symbol
    /// stream. It's a safety check to prevent buffer overruns during parsing,
    /// and always aborts the whole parse - no partial function is published.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// A custom metadata block declares a version this library does not understand.
    ///
    /// Managed custom metadata (`MD2`) is only defined for version 4. Any other
    /// value indicates a producer this library cannot decode, and decoding of the
    /// enclosing OEM block is aborted.
    #[error("Unsupported custom metadata version: {0}")]
    UnsupportedVersion(u8),

    /// Provided input was empty.
    ///
    /// This error occurs when an empty buffer is provided where actual symbol
    /// stream data was expected.
    #[error("Provided input was empty")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_error_macro_plain() {
        let error = malformed_error!("record truncated");
        match error {
            Error::Malformed { message, file, .. } => {
                assert_eq!(message, "record truncated");
                assert!(file.ends_with("error.rs"));
            }
            _ => panic!("Expected Malformed variant"),
        }
    }

    #[test]
    fn malformed_error_macro_format() {
        let error = malformed_error!("segment is {}, expected {}", 2, 1);
        match error {
            Error::Malformed { message, .. } => {
                assert_eq!(message, "segment is 2, expected 1");
            }
            _ => panic!("Expected Malformed variant"),
        }
    }

    #[test]
    fn out_of_bounds_error_macro() {
        assert!(matches!(out_of_bounds_error!(), Error::OutOfBounds));
    }

    #[test]
    fn error_display() {
        assert_eq!(
            Error::UnsupportedVersion(5).to_string(),
            "Unsupported custom metadata version: 5"
        );
        assert_eq!(Error::Empty.to_string(), "Provided input was empty");
    }
}
