//! Byte-level parsing infrastructure for PDB symbol streams.
//!
//! This module holds the low-level reading machinery the symbol decoder is built on.
//! The outer container format (MSF directory, DBI module info) is an external
//! collaborator: it locates the managed symbol sub-stream and hands this library a
//! fully resident byte buffer plus start/limit offsets. Everything in here operates
//! on that in-memory range; no I/O happens at this layer.
//!
//! # Key Components
//!
//! - [`crate::file::parser::Parser`] - Cursor-based reader over an immutable byte range
//! - [`crate::file::io`] - Endian-aware bounds-checked primitive reads

pub(crate) mod io;
pub(crate) mod parser;
