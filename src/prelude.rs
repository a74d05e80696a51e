//! # pdbscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and
//! traits from the pdbscope library. Import this module to get quick access to the
//! essential types for managed symbol stream decoding.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all pdbscope operations
pub use crate::Error;

/// The result type used throughout pdbscope
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Main entry point for managed symbol stream decoding
pub use crate::SymbolStream;

/// Low-level byte stream parsing utilities
pub use crate::Parser;

// ================================================================================================
// Functions and Ordering
// ================================================================================================

/// One decoded managed procedure and its address comparators
pub use crate::symbols::function::{by_address, by_address_and_token, Function};

/// The single code segment managed code lives in
pub use crate::symbols::function::MANAGED_CODE_SEGMENT;

// ================================================================================================
// Scopes and Entries
// ================================================================================================

/// Lexical scope tree and the entry types scopes address
pub use crate::symbols::scope::{Constant, ConstantValue, Scope, Slot, SlotFlags};

// ================================================================================================
// Records and Identity
// ================================================================================================

/// Record kinds the decoder interprets
pub use crate::symbols::kind::SymbolKind;

/// Metadata token type linking procedures to method definitions
pub use crate::symbols::token::Token;

/// Procedure flags
pub use crate::symbols::records::ProcFlags;

// ================================================================================================
// Source Mapping
// ================================================================================================

/// Sequence points attached from the lines sub-stream
pub use crate::symbols::lines::{SequencePoint, HIDDEN_LINE};
