//! Managed symbol stream decoding.
//!
//! This module turns the managed-code symbol sub-stream of a PDB file into
//! structured per-function debugging metadata: address ranges, lexical scopes,
//! local variable slots, compile-time constants, namespace-using information, and
//! iterator linkage. Debuggers, profilers, and decompilers use the result to map a
//! code address or IL offset back to source-level names and scoping.
//!
//! # Architecture
//!
//! Decoding is a pure, synchronous transformation over an immutable byte buffer
//! the outer container layer has already located and made resident. The pipeline,
//! leaves first:
//!
//! - [`crate::file::parser::Parser`] - bounds-checked byte cursor
//! - [`crate::symbols::records`] - record framing and fixed payload layouts
//! - [`crate::symbols::function`] - two-pass scanner: count and locate managed
//!   procedures, then build each [`Function`] (in parallel, one task per procedure)
//! - [`crate::symbols::scope`] - per-function sizing pass and recursive scope tree
//!   construction over shared, presized entry arrays
//! - [`crate::symbols::oem`] - custom metadata (`MD2`) sub-decoder
//!
//! Unknown record kinds and unknown custom-metadata item kinds are never errors:
//! every record and metadata item declares its own length, and the decoder always
//! trusts the declared length over the payload shape, skipping what it does not
//! understand. Structural violations - a procedure outside segment 1, nonzero
//! parent/next links, a body scan missing its declared end - are fatal and abort
//! the entire parse.
//!
//! # Key Components
//!
//! - [`crate::symbols::SymbolStream`] - Entry point over a `(buffer, start, limit)` range
//! - [`crate::symbols::function::Function`] - One decoded managed procedure
//! - [`crate::symbols::scope::Scope`] - Lexical scope with entry ranges and children
//! - [`crate::symbols::kind::SymbolKind`] - Record kinds this decoder interprets
//!
//! # Usage Examples
//!
//! ```rust,no_run
//! use pdbscope::SymbolStream;
//!
//! # fn module_symbols() -> (Vec<u8>, usize, usize) { (vec![0], 0, 0) }
//! // The container layer locates the managed symbol range for a module
//! let (buffer, start, limit) = module_symbols();
//!
//! let stream = SymbolStream::new(&buffer, start, limit)?;
//! let mut functions = stream.functions(true)?;
//!
//! // Stream order is not address order; sort before binary searching
//! functions.sort_by(pdbscope::symbols::function::by_address_and_token);
//!
//! for function in &functions {
//!     println!(
//!         "{} at {:04x}:{:08x}, {} slots",
//!         function.token,
//!         function.segment,
//!         function.address,
//!         function.slots.len()
//!     );
//! }
//! # Ok::<(), pdbscope::Error>(())
//! ```

pub mod function;
pub mod kind;
pub mod lines;
pub(crate) mod oem;
pub(crate) mod records;
pub mod scope;
pub mod token;

pub use function::{by_address, by_address_and_token, Function, MANAGED_CODE_SEGMENT};
pub use kind::SymbolKind;
pub use lines::SequencePoint;
pub use records::{ProcFlags, ProcedureRecord};
pub use scope::{Constant, ConstantValue, Scope, Slot, SlotFlags};
pub use token::Token;

use crate::{Error, Result};

/// The managed symbol sub-stream of one module, ready to decode.
///
/// Wraps the byte range the outer container layer hands over: the raw buffer plus
/// the `[start, limit)` window holding exactly the managed symbol records. The
/// stream itself stays immutable; every decode call works on its own cursor, so a
/// `SymbolStream` can be shared and decoded repeatedly.
///
/// # Examples
///
/// ```rust
/// use pdbscope::SymbolStream;
///
/// // A stream with no procedure records decodes to an empty function list
/// let data = [0x02, 0x00, 0x06, 0x00]; // lone S_END record
/// let stream = SymbolStream::new(&data, 0, data.len())?;
/// assert!(stream.functions(true)?.is_empty());
/// # Ok::<(), pdbscope::Error>(())
/// ```
pub struct SymbolStream<'a> {
    data: &'a [u8],
    start: usize,
    limit: usize,
}

impl<'a> SymbolStream<'a> {
    /// Create a new [`SymbolStream`] over `data[start..limit]`.
    ///
    /// # Arguments
    /// * `data` - The raw symbol stream buffer
    /// * `start` - Offset of the first record
    /// * `limit` - Offset one past the last record
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] for an empty buffer, or
    /// [`crate::Error::OutOfBounds`] if the window does not lie within the buffer.
    pub fn new(data: &'a [u8], start: usize, limit: usize) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::Empty);
        }
        if start > limit || limit > data.len() {
            return Err(out_of_bounds_error!());
        }

        Ok(SymbolStream { data, start, limit })
    }

    /// Returns the underlying buffer.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data
    }

    /// Decode every managed procedure in the stream window.
    ///
    /// Pass 1 locates and counts the procedure records; pass 2 builds one
    /// [`Function`] per record, in parallel. Functions come back in stream order.
    /// A window without any procedure records yields an empty vector without
    /// allocating function storage.
    ///
    /// # Arguments
    /// * `read_strings` - Whether to materialize embedded names (procedures,
    ///   slots, constants) or skip them for throughput
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if any record overruns the stream,
    /// [`crate::Error::Malformed`] on structural invariant violations, or
    /// [`crate::Error::UnsupportedVersion`] for undecodable custom metadata. Any
    /// error aborts the whole decode; no partial result is returned.
    pub fn functions(&self, read_strings: bool) -> Result<Vec<Function>> {
        let offsets = function::collect_procedures(self.data, self.start, self.limit)?;
        if offsets.is_empty() {
            return Ok(Vec::new());
        }

        function::build_functions(self.data, &offsets, read_strings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_buffer() {
        assert!(matches!(SymbolStream::new(&[], 0, 0), Err(Error::Empty)));
    }

    #[test]
    fn rejects_invalid_window() {
        let data = [0u8; 8];
        assert!(SymbolStream::new(&data, 4, 2).is_err());
        assert!(SymbolStream::new(&data, 0, 9).is_err());
        assert!(SymbolStream::new(&data, 0, 8).is_ok());
    }

    #[test]
    fn stream_without_procedures_is_empty() {
        // Two records, neither a managed procedure: S_END and an unknown kind
        let data = [
            0x02, 0x00, 0x06, 0x00, // S_END
            0x04, 0x00, 0xFF, 0x10, 0xAA, 0xBB, // unknown kind, 2 payload bytes
        ];
        let stream = SymbolStream::new(&data, 0, data.len()).unwrap();
        let functions = stream.functions(true).unwrap();
        assert!(functions.is_empty());
    }
}
