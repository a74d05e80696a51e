// Copyright 2026 pdbscope contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # pdbscope
//!
//! A cross-platform decoder for the managed-code symbol sub-stream of PDB
//! (program database) files. Built in pure Rust, `pdbscope` turns the raw
//! CodeView record sequence a managed compiler emits into structured per-function
//! debugging metadata - address ranges, lexical scope trees, local variable
//! slots, compile-time constants, namespace imports, and iterator-class linkage -
//! without requiring Windows or any debugger SDK.
//!
//! ## Features
//!
//! - **Self-framed record parsing** - Every record declares its own length, so
//!   unknown record kinds are skipped, never fatal
//! - **Full scope trees** - Nested lexical blocks with slots, constants, and
//!   used namespaces, addressed through compact index ranges over
//!   function-owned arrays
//! - **Custom metadata** - The `MD2` extension block: per-scope using counts
//!   and forward-iterator class names
//! - **Parallel decoding** - Functions are independent byte ranges and are
//!   built one rayon task each
//! - **Memory safe** - No `unsafe`, with every read bounds-checked against the
//!   stream
//!
//! ## Quick Start
//!
//! Add `pdbscope` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! pdbscope = "0.1"
//! ```
//!
//! ### Using the Prelude
//!
//! For convenient access to the most commonly used types, import the prelude:
//!
//! ```rust,no_run
//! use pdbscope::prelude::*;
//!
//! # fn module_symbols() -> (Vec<u8>, usize, usize) { (vec![0], 0, 0) }
//! // The container layer hands over the module's symbol byte range
//! let (buffer, start, limit) = module_symbols();
//!
//! let stream = SymbolStream::new(&buffer, start, limit)?;
//! let functions = stream.functions(true)?;
//! println!("Found {} managed functions", functions.len());
//! # Ok::<(), pdbscope::Error>(())
//! ```
//!
//! ### Scope Inspection
//!
//! ```rust,no_run
//! use pdbscope::prelude::*;
//!
//! # fn decode() -> pdbscope::Result<Vec<Function>> { Ok(Vec::new()) }
//! let functions = decode()?;
//! for function in &functions {
//!     // Shallow search over the function's top-level scopes
//!     if let Some(scope) = function.find_scope_containing(function.address) {
//!         for slot in function.scope_slots(scope) {
//!             println!("slot {}: {:?}", slot.slot, slot.name);
//!         }
//!     }
//! }
//! # Ok::<(), pdbscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `pdbscope` is organized into a small set of modules:
//!
//! - [`prelude`] - Convenient re-exports of commonly used types
//! - [`symbols`] - Record framing, the two-pass function scanner, scope tree
//!   construction, and the custom metadata decoder
//! - [`Error`] and [`Result`] - Comprehensive error handling
//!
//! The [`SymbolStream`] is the main entry point. It wraps an immutable byte
//! buffer plus the `[start, limit)` window of one module's managed symbol
//! records; [`SymbolStream::functions`] decodes the whole window into a vector
//! of [`symbols::function::Function`] values in stream order.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result). Decoding is
//! all-or-nothing: any structural violation aborts the whole parse, and no
//! partially decoded function is ever published.
//!
//! ```rust
//! use pdbscope::{Error, SymbolStream};
//!
//! match SymbolStream::new(&[], 0, 0) {
//!     Ok(_) => println!("Stream accepted"),
//!     Err(Error::Empty) => println!("No data provided"),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```

#[macro_use]
pub(crate) mod error;
pub(crate) mod file;

/// Convenient re-exports of the most commonly used types and traits.
///
/// This module provides a curated selection of the most frequently used types
/// from across the pdbscope library, allowing for convenient glob imports.
///
/// # Example
///
/// ```rust,no_run
/// use pdbscope::prelude::*;
///
/// # fn module_symbols() -> (Vec<u8>, usize, usize) { (vec![0], 0, 0) }
/// let (buffer, start, limit) = module_symbols();
/// let stream = SymbolStream::new(&buffer, start, limit)?;
/// let functions = stream.functions(true)?;
/// # Ok::<(), pdbscope::Error>(())
/// ```
pub mod prelude;

pub mod symbols;

/// `pdbscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
/// This is used consistently throughout the crate for all fallible operations.
///
/// # Examples
///
/// ```rust,no_run
/// use pdbscope::{Result, SymbolStream};
///
/// fn open_stream(data: &[u8]) -> Result<SymbolStream> {
///     SymbolStream::new(data, 0, data.len())
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `pdbscope` Error type
///
/// The main error type for all operations in this crate. Provides detailed error
/// information for stream framing, record payload parsing, and custom metadata
/// decoding.
///
/// # Examples
///
/// ```rust
/// use pdbscope::{Error, SymbolStream};
///
/// match SymbolStream::new(&[], 0, 0) {
///     Ok(_) => println!("Stream accepted"),
///     Err(Error::Empty) => println!("No data provided"),
///     Err(Error::Malformed { message, .. }) => println!("Malformed: {}", message),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
pub use error::Error;

/// Provides access to low-level byte stream parsing utilities.
///
/// The [`Parser`] type is the bounds-checked cursor every record and payload
/// decoder in this crate reads through.
///
/// # Example
///
/// ```rust
/// use pdbscope::Parser;
///
/// let data = [0x06, 0x00, 0x2A, 0x11];
/// let mut parser = Parser::new(&data);
/// let size = parser.read_le::<u16>()?;
/// assert_eq!(size, 6);
/// # Ok::<(), pdbscope::Error>(())
/// ```
pub use file::parser::Parser;

/// Main entry point for decoding a module's managed symbol records.
///
/// See [`symbols::SymbolStream`] for construction and decoding.
///
/// # Example
///
/// ```rust
/// use pdbscope::SymbolStream;
///
/// let data = [0x02, 0x00, 0x06, 0x00]; // lone terminating record
/// let stream = SymbolStream::new(&data, 0, data.len())?;
/// assert!(stream.functions(true)?.is_empty());
/// # Ok::<(), pdbscope::Error>(())
/// ```
pub use symbols::SymbolStream;
