//! Lexical scopes, local slots, and constants of a managed procedure.
//!
//! A procedure's body is a flat record sequence in which `S_BLOCK32` records open
//! nested lexical scopes, each closed by the `S_END` record its header points at.
//! This module turns that sequence into a [`crate::symbols::scope::Scope`] tree.
//!
//! # Storage Model
//!
//! Slots, constants, and used namespaces are owned by the **function**, not by the
//! scope they appear under: the function presizes one array per entry kind (sized by
//! [`count_scopes_and_slots`]) and every scope holds index ranges into those shared
//! arrays. A scope's range is the contiguous run of entries consumed while scanning
//! its byte range, including entries consumed by nested scopes. This keeps
//! scope-to-slot slicing cheap and allocation-free after the sizing pass.
//!
//! The sizing pass and the building pass visit records with the same kind set and
//! the same end-of-record repositioning, so counted lengths always match the number
//! of entries written during building; a mismatch would be a programming error in
//! this module, never a data-dependent condition.
//!
//! # Key Components
//!
//! - [`crate::symbols::scope::Scope`] - One lexical scope with child scopes and entry ranges
//! - [`crate::symbols::scope::Slot`] - A local variable's storage and type description
//! - [`crate::symbols::scope::Constant`] - A compile-time constant with decoded value
//! - [`crate::symbols::scope::ConstantValue`] - CodeView numeric-leaf value
//! - [`crate::symbols::scope::Scope::find_scope_containing`] - Shallow child lookup by offset

use std::ops::Range;

use bitflags::bitflags;

use crate::{
    file::parser::Parser,
    symbols::{
        kind::SymbolKind,
        records::{BlockRecord, RecordHeader},
        token::Token,
    },
    Result,
};

bitflags! {
    /// Flags describing a managed local variable slot.
    ///
    /// See `CV_LVARFLAGS` in `cvinfo.h`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SlotFlags: u16 {
        /// Variable is a parameter
        const IS_PARAM = 0x0001;
        /// Address is taken
        const ADDR_TAKEN = 0x0002;
        /// Compiler generated
        const COMP_GENX = 0x0004;
        /// The symbol is splayed across multiple registers
        const IS_AGGREGATE = 0x0008;
        /// Part of an aggregated symbol
        const IS_AGGREGATED = 0x0010;
        /// Variable has multiple simultaneous lifetimes
        const IS_ALIASED = 0x0020;
        /// Represents one of the multiple lifetimes
        const IS_ALIAS = 0x0040;
        /// Represents a function return value
        const IS_RETVALUE = 0x0080;
        /// Optimized away by the compiler
        const IS_OPTIMIZED_OUT = 0x0100;
        /// Global variable enregistered
        const IS_ENREG_GLOB = 0x0200;
        /// Static variable enregistered
        const IS_ENREG_STAT = 0x0400;
    }
}

/// A managed local variable slot, one per `S_MANSLOT` record.
///
/// Wire layout: `index:u32, typind:u32, offCod:u32, segCod:u16, flags:u16, name:C-string`.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    /// IL slot index of the variable
    pub slot: u32,
    /// Type index of the variable's declared type
    pub type_index: u32,
    /// First code offset where the slot is live
    pub offset: u32,
    /// Segment of the first code offset
    pub segment: u16,
    /// Slot flags
    pub flags: SlotFlags,
    /// Variable name; [`None`] when string materialization was disabled
    pub name: Option<String>,
}

impl Slot {
    pub(crate) fn read(parser: &mut Parser, read_strings: bool) -> Result<Slot> {
        let slot = parser.read_le::<u32>()?;
        let type_index = parser.read_le::<u32>()?;
        let offset = parser.read_le::<u32>()?;
        let segment = parser.read_le::<u16>()?;
        let flags = SlotFlags::from_bits_retain(parser.read_le::<u16>()?);
        let name = if read_strings {
            Some(parser.read_string_utf8()?)
        } else {
            parser.skip_string_utf8();
            None
        };

        Ok(Slot {
            slot,
            type_index,
            offset,
            segment,
            flags,
            name,
        })
    }
}

/// A compile-time constant value decoded from the CodeView numeric-leaf encoding.
///
/// Values below `0x8000` are stored directly in the leaf tag; larger or typed
/// values follow as a tagged payload. Unknown leaf tags are tolerated: the value
/// becomes [`ConstantValue::Unknown`] and the record framer recovers the cursor.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    /// Direct value encoded in the leaf tag (`< 0x8000`)
    U16(u16),
    /// `LF_CHAR`
    I8(i8),
    /// `LF_SHORT`
    I16(i16),
    /// `LF_USHORT`
    UShort(u16),
    /// `LF_LONG`
    I32(i32),
    /// `LF_ULONG`
    U32(u32),
    /// `LF_REAL32`
    F32(f32),
    /// `LF_REAL64`
    F64(f64),
    /// `LF_QUADWORD`
    I64(i64),
    /// `LF_UQUADWORD`
    U64(u64),
    /// `LF_VARSTRING`
    String(String),
    /// `LF_DECIMAL` - .NET 128-bit decimal, raw bytes
    Decimal([u8; 16]),
    /// Any leaf tag this decoder does not interpret
    Unknown(u16),
}

impl ConstantValue {
    /// Read a numeric leaf at the current cursor position.
    ///
    /// For an unknown leaf the payload shape is unknowable, so nothing past the
    /// tag is consumed and the caller must rely on the record frame to resume.
    pub(crate) fn read(parser: &mut Parser) -> Result<ConstantValue> {
        let leaf = parser.read_le::<u16>()?;
        if leaf < 0x8000 {
            return Ok(ConstantValue::U16(leaf));
        }

        match leaf {
            0x8000 => Ok(ConstantValue::I8(parser.read_le::<i8>()?)),
            0x8001 => Ok(ConstantValue::I16(parser.read_le::<i16>()?)),
            0x8002 => Ok(ConstantValue::UShort(parser.read_le::<u16>()?)),
            0x8003 => Ok(ConstantValue::I32(parser.read_le::<i32>()?)),
            0x8004 => Ok(ConstantValue::U32(parser.read_le::<u32>()?)),
            0x8005 => Ok(ConstantValue::F32(parser.read_le::<f32>()?)),
            0x8006 => Ok(ConstantValue::F64(parser.read_le::<f64>()?)),
            0x8009 => Ok(ConstantValue::I64(parser.read_le::<i64>()?)),
            0x800A => Ok(ConstantValue::U64(parser.read_le::<u64>()?)),
            0x8010 => Ok(ConstantValue::String(parser.read_prefixed_string_utf8()?)),
            0x8019 => {
                let mut bytes = [0u8; 16];
                for byte in &mut bytes {
                    *byte = parser.read_le::<u8>()?;
                }
                Ok(ConstantValue::Decimal(bytes))
            }
            _ => Ok(ConstantValue::Unknown(leaf)),
        }
    }

    fn is_unknown(&self) -> bool {
        matches!(self, ConstantValue::Unknown(_))
    }
}

/// A managed compile-time constant, one per `S_MANCONSTANT` record.
///
/// Wire layout: `token:u32, value:numeric-leaf, name:C-string`.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    /// Metadata token of the constant's type
    pub token: Token,
    /// Decoded constant value
    pub value: ConstantValue,
    /// Constant name; [`None`] when string materialization was disabled or the
    /// value leaf was unknown (the name cannot be located past an unknown leaf)
    pub name: Option<String>,
}

impl Constant {
    pub(crate) fn read(parser: &mut Parser, read_strings: bool) -> Result<Constant> {
        let token = Token::new(parser.read_le::<u32>()?);
        let value = ConstantValue::read(parser)?;
        let name = if value.is_unknown() {
            None
        } else if read_strings {
            Some(parser.read_string_utf8()?)
        } else {
            parser.skip_string_utf8();
            None
        };

        Ok(Constant { token, value, name })
    }
}

/// One lexical scope of a managed procedure.
///
/// The first scope of a function is implicit: it spans the whole procedure and owns
/// the full slot/constant/namespace arrays whenever the function has any such
/// entries. Every further scope corresponds to one `S_BLOCK32` record. Scopes are
/// built in record order, which is not guaranteed to be sorted by offset.
///
/// `slots`, `constants`, and `namespaces` are index ranges into the owning
/// function's shared arrays; resolve them through
/// [`crate::symbols::function::Function::scope_slots`] and friends, or index the
/// arrays directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    /// Start offset of the scope within its segment
    pub offset: u32,
    /// Length in bytes of the range the scope covers; the scope spans
    /// `[offset, offset + length]`
    pub length: u32,
    /// Range of this scope's entries in the function's slot array
    pub slots: Range<usize>,
    /// Range of this scope's entries in the function's constant array
    pub constants: Range<usize>,
    /// Range of this scope's entries in the function's namespace array
    pub namespaces: Range<usize>,
    /// Child scopes, in record order
    pub scopes: Vec<Scope>,
}

impl Scope {
    /// Returns `true` if `offset` falls within this scope's `[start, start + length]`
    /// range (inclusive on both ends).
    #[must_use]
    pub fn contains(&self, offset: u32) -> bool {
        u64::from(offset) >= u64::from(self.offset)
            && u64::from(offset) <= u64::from(self.offset) + u64::from(self.length)
    }

    /// Finds a direct child scope whose range contains the given offset.
    ///
    /// The search is shallow by design: only direct children are examined, never
    /// grandchildren. Callers that need the innermost scope repeat the call against
    /// the returned child until it yields [`None`].
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let mut scope = function.find_scope_containing(il_offset);
    /// while let Some(inner) = scope.and_then(|s| s.find_scope_containing(il_offset)) {
    ///     scope = Some(inner);
    /// }
    /// ```
    #[must_use]
    pub fn find_scope_containing(&self, offset: u32) -> Option<&Scope> {
        self.scopes.iter().find(|scope| scope.contains(offset))
    }
}

/// Entry counts produced by the sizing pass over a byte range.
///
/// `scopes` counts only direct-child blocks of the range (nested block bodies are
/// skipped via their declared end); `slots`, `constants`, and `namespaces` are
/// cumulative across all nesting levels, because those entries land in the
/// function's shared arrays regardless of depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ScopeCounts {
    pub scopes: usize,
    pub slots: usize,
    pub constants: usize,
    pub namespaces: usize,
}

impl ScopeCounts {
    pub(crate) fn has_entries(&self) -> bool {
        self.slots > 0 || self.constants > 0 || self.namespaces > 0
    }
}

/// Counts block, slot, constant, and used-namespace records between the current
/// cursor position and `limit`, without building anything.
///
/// The cursor is restored to its starting position before returning, so the caller
/// can immediately rescan the same range to build. Record visitation mirrors the
/// building pass exactly: same kind set, same reseek to each record's declared end,
/// same descent into block bodies.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if a record frame or a block's declared
/// end lies outside the stream.
pub(crate) fn count_scopes_and_slots(parser: &mut Parser, limit: usize) -> Result<ScopeCounts> {
    let start = parser.pos();
    let mut counts = ScopeCounts::default();

    while parser.pos() < limit {
        let header = RecordHeader::read(parser)?;
        match SymbolKind::from_value(header.kind) {
            Some(SymbolKind::Block) => {
                let _parent = parser.read_le::<u32>()?;
                let end = parser.read_le::<u32>()? as usize;
                header.validate_scope_end(end)?;
                counts.scopes += 1;

                parser.seek(header.end)?;
                let inner = count_scopes_and_slots(parser, end)?;
                counts.slots += inner.slots;
                counts.constants += inner.constants;
                counts.namespaces += inner.namespaces;

                parser.seek(end)?;
            }
            Some(SymbolKind::ManagedSlot) => {
                counts.slots += 1;
                parser.seek(header.end)?;
            }
            Some(SymbolKind::ManagedConstant) => {
                counts.constants += 1;
                parser.seek(header.end)?;
            }
            Some(SymbolKind::UsingNamespace) => {
                counts.namespaces += 1;
                parser.seek(header.end)?;
            }
            _ => parser.seek(header.end)?,
        }
    }

    parser.seek(start)?;
    Ok(counts)
}

/// Accumulates the function-owned entry arrays while the scope tree is built.
///
/// The running lengths of the three vectors are the index cursors of the storage
/// model: a scope's slice starts at the lengths observed when its scan begins and
/// ends at the lengths when its scan (including nested scans) stops.
pub(crate) struct ScopeBuilder {
    read_strings: bool,
    pub(crate) slots: Vec<Slot>,
    pub(crate) constants: Vec<Constant>,
    pub(crate) namespaces: Vec<String>,
}

impl ScopeBuilder {
    pub(crate) fn new(counts: ScopeCounts, read_strings: bool) -> Self {
        ScopeBuilder {
            read_strings,
            slots: Vec::with_capacity(counts.slots),
            constants: Vec::with_capacity(counts.constants),
            namespaces: Vec::with_capacity(counts.namespaces),
        }
    }

    /// Synthesizes the implicit top-level scope spanning the whole function,
    /// granting it ownership of the full entry arrays.
    pub(crate) fn root_scope(counts: ScopeCounts, offset: u32, length: u32) -> Scope {
        Scope {
            offset,
            length,
            slots: 0..counts.slots,
            constants: 0..counts.constants,
            namespaces: 0..counts.namespaces,
            scopes: Vec::new(),
        }
    }

    /// Reads one entry record into the shared arrays. The caller is responsible for
    /// reseeking to the record's end afterwards.
    pub(crate) fn read_entry(&mut self, parser: &mut Parser, kind: SymbolKind) -> Result<()> {
        match kind {
            SymbolKind::ManagedSlot => {
                let slot = Slot::read(parser, self.read_strings)?;
                self.slots.push(slot);
            }
            SymbolKind::ManagedConstant => {
                let constant = Constant::read(parser, self.read_strings)?;
                self.constants.push(constant);
            }
            SymbolKind::UsingNamespace => {
                let namespace = parser.read_string_utf8()?;
                self.namespaces.push(namespace);
            }
            _ => {}
        }
        Ok(())
    }

    /// Recursively builds the scope for one `S_BLOCK32` record.
    ///
    /// On entry the cursor sits at the block record's frame end (the first inner
    /// record); on return the caller must reseek to the block's declared `end`.
    /// Entries are consumed from the shared arrays; child blocks recurse through
    /// this same builder.
    pub(crate) fn build_block(&mut self, parser: &mut Parser, block: &BlockRecord) -> Result<Scope> {
        let block_end = block.end as usize;
        let counts = count_scopes_and_slots(parser, block_end)?;
        let mut children = Vec::with_capacity(counts.scopes);

        let slot_start = self.slots.len();
        let constant_start = self.constants.len();
        let namespace_start = self.namespaces.len();

        while parser.pos() < block_end {
            let header = RecordHeader::read(parser)?;
            match SymbolKind::from_value(header.kind) {
                Some(SymbolKind::Block) => {
                    let sub = BlockRecord::read(parser)?;
                    header.validate_scope_end(sub.end as usize)?;
                    parser.seek(header.end)?;
                    children.push(self.build_block(parser, &sub)?);
                    parser.seek(sub.end as usize)?;
                }
                Some(
                    kind @ (SymbolKind::ManagedSlot
                    | SymbolKind::ManagedConstant
                    | SymbolKind::UsingNamespace),
                ) => {
                    self.read_entry(parser, kind)?;
                    parser.seek(header.end)?;
                }
                _ => parser.seek(header.end)?,
            }
        }

        debug_assert_eq!(children.len(), counts.scopes);

        Ok(Scope {
            offset: block.offset,
            length: block.len,
            slots: slot_start..self.slots.len(),
            constants: constant_start..self.constants.len(),
            namespaces: namespace_start..self.namespaces.len(),
            scopes: children,
        })
    }
}
