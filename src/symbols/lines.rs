//! Sequence point types mapping IL offsets to source locations.
//!
//! Sequence points do not live in the symbol sub-stream this library decodes; they
//! are produced by the collaborator that parses the PDB's lines sub-stream and are
//! attached to a [`crate::symbols::function::Function`] after construction via
//! [`crate::symbols::function::Function::set_sequence_points`]. The types live here
//! so a fully assembled function exposes its complete debugging surface.

/// Line number marking a hidden sequence point.
///
/// Compilers emit `0xFEEFEE` as the start line of sequence points that cover
/// compiler-generated code a debugger should step over.
pub const HIDDEN_LINE: u32 = 0x00FE_EFEE;

/// Represents a single sequence point mapping an IL offset to a source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencePoint {
    /// Offset in the method's IL stream
    pub il_offset: u32,
    /// Starting line in the source file
    pub start_line: u32,
    /// Starting column in the source file
    pub start_col: u16,
    /// Ending line in the source file
    pub end_line: u32,
    /// Ending column in the source file
    pub end_col: u16,
}

impl SequencePoint {
    /// True if this sequence point covers compiler-generated code
    /// (`start_line == 0xFEEFEE`).
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.start_line == HIDDEN_LINE
    }
}
