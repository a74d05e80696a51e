//! Managed functions and the two-pass scanner that builds them.
//!
//! The managed symbol stream is scanned twice. Pass 1 walks the record sequence
//! from `start` to `limit`, counts `S_GMANPROC`/`S_LMANPROC` records, and notes
//! where each one starts - skipping over every procedure's body through its
//! declared end offset and over every other record through its frame. Pass 2 then
//! builds one [`Function`] per noted offset.
//!
//! Because pass 1 fixes each procedure's byte range before pass 2 begins, and
//! those ranges are disjoint, building the functions is embarrassingly parallel:
//! pass 2 runs one rayon task per procedure, each with its own cursor, writing
//! into its own result slot. Output order is stream order, which is not guaranteed
//! to be address order - callers needing address-based lookup sort with
//! [`by_address`] or [`by_address_and_token`] afterwards.
//!
//! # Key Components
//!
//! - [`crate::symbols::function::Function`] - One managed procedure with its full scope tree
//! - [`crate::symbols::function::by_address`] - Comparator over (segment, address)
//! - [`crate::symbols::function::by_address_and_token`] - Same, with token tie-break
//!
//! # Structural Invariants
//!
//! For well-formed input the format guarantees, and this module enforces:
//! - a managed procedure's segment is the managed code segment (1)
//! - a managed procedure's parent and next links are zero
//! - a procedure's or block's declared scope end never precedes its own record,
//!   so every seek moves the scanner forward
//! - after the body scan the cursor sits exactly on the procedure's declared end,
//!   where an `S_END` record terminates the scope
//!
//! Violations surface as [`crate::Error::Malformed`] and abort the whole build;
//! no partial function is ever published.

use std::cmp::Ordering;

use rayon::prelude::*;

use crate::{
    file::parser::Parser,
    symbols::{
        kind::SymbolKind,
        lines::SequencePoint,
        oem::{decode_oem, CustomMetadata},
        records::{BlockRecord, ProcFlags, ProcedureRecord, RecordHeader},
        scope::{count_scopes_and_slots, Constant, Scope, ScopeBuilder, Slot},
        token::Token,
    },
    Result,
};

/// The single code segment managed code lives in.
pub const MANAGED_CODE_SEGMENT: u16 = 1;

/// One managed procedure decoded from the symbol stream.
///
/// A function owns everything it exposes: scopes, slots, constants, and namespace
/// strings are copied out of the raw buffer during construction, so the function
/// holds no references into the stream once parsing completes.
///
/// Slots, constants, and namespaces live in function-level arrays; each
/// [`Scope`] addresses its lexical share of them through index ranges, resolved
/// via [`Function::scope_slots`], [`Function::scope_constants`], and
/// [`Function::scope_namespaces`].
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Metadata token of the method this procedure implements
    pub token: Token,
    /// Segment id; always [`MANAGED_CODE_SEGMENT`]
    pub segment: u16,
    /// Offset of the procedure within its segment
    pub address: u32,
    /// Length in bytes of the procedure's code
    pub len: u32,
    /// Procedure flags
    pub flags: ProcFlags,
    /// Procedure name; [`None`] when string materialization was disabled
    pub name: Option<String>,
    /// Scope list in record order; the first entry is the implicit top-level scope
    /// spanning the whole function, present whenever the function owns any slots,
    /// constants, or used namespaces
    pub scopes: Vec<Scope>,
    /// All slots of the function, across every nesting level, in stream order
    pub slots: Vec<Slot>,
    /// All constants of the function, in stream order
    pub constants: Vec<Constant>,
    /// All used-namespace names of the function, in stream order
    pub namespaces: Vec<String>,
    /// Per-scope counts of visible leading using-entries, from custom metadata
    pub using_counts: Option<Vec<u16>>,
    /// Iterator class this method's body was moved into, from custom metadata
    pub iterator_class: Option<String>,
    /// Sequence points attached by the lines-stream collaborator; empty until
    /// [`Function::set_sequence_points`] is called
    pub sequence_points: Vec<SequencePoint>,
}

impl Function {
    /// Finds a top-level scope whose range contains the given offset.
    ///
    /// Like [`Scope::find_scope_containing`], the search is shallow: only the
    /// function's direct scope list is examined. Callers needing the innermost
    /// scope repeat the call against the returned scope's children.
    #[must_use]
    pub fn find_scope_containing(&self, offset: u32) -> Option<&Scope> {
        self.scopes.iter().find(|scope| scope.contains(offset))
    }

    /// Resolves a scope's slot range against this function's slot array.
    #[must_use]
    pub fn scope_slots(&self, scope: &Scope) -> &[Slot] {
        &self.slots[scope.slots.clone()]
    }

    /// Resolves a scope's constant range against this function's constant array.
    #[must_use]
    pub fn scope_constants(&self, scope: &Scope) -> &[Constant] {
        &self.constants[scope.constants.clone()]
    }

    /// Resolves a scope's namespace range against this function's namespace array.
    #[must_use]
    pub fn scope_namespaces(&self, scope: &Scope) -> &[String] {
        &self.namespaces[scope.namespaces.clone()]
    }

    /// Attaches sequence points decoded from the PDB's lines sub-stream.
    pub fn set_sequence_points(&mut self, points: Vec<SequencePoint>) {
        self.sequence_points = points;
    }

    /// Returns the sequence point governing the given IL offset: the last point
    /// whose offset does not exceed it. Points are expected in ascending IL
    /// order, as the lines sub-stream stores them.
    #[must_use]
    pub fn sequence_point_at(&self, il_offset: u32) -> Option<&SequencePoint> {
        self.sequence_points
            .iter()
            .take_while(|point| point.il_offset <= il_offset)
            .last()
    }

    /// Builds a function from its procedure record, scanning the body range
    /// `[cursor, proc.end)`.
    fn from_record(
        proc: ProcedureRecord,
        parser: &mut Parser,
        read_strings: bool,
    ) -> Result<Function> {
        if proc.segment != MANAGED_CODE_SEGMENT {
            return Err(malformed_error!(
                "Managed procedure for token {} has segment {}, expected {}",
                proc.token,
                proc.segment,
                MANAGED_CODE_SEGMENT
            ));
        }
        if proc.parent != 0 || proc.next != 0 {
            return Err(malformed_error!(
                "Managed procedure for token {} has parent {} and next {}, both must be 0",
                proc.token,
                proc.parent,
                proc.next
            ));
        }

        let body_end = proc.end as usize;
        let counts = count_scopes_and_slots(parser, body_end)?;

        let mut builder = ScopeBuilder::new(counts, read_strings);
        let mut scopes = Vec::with_capacity(counts.scopes + usize::from(counts.has_entries()));
        if counts.has_entries() {
            scopes.push(ScopeBuilder::root_scope(counts, proc.offset, proc.len));
        }

        let mut metadata = CustomMetadata::default();

        while parser.pos() < body_end {
            let header = RecordHeader::read(parser)?;
            match SymbolKind::from_value(header.kind) {
                Some(SymbolKind::Oem) => {
                    decode_oem(parser, &mut metadata)?;
                    parser.seek(header.end)?;
                }
                Some(SymbolKind::Block) => {
                    let block = BlockRecord::read(parser)?;
                    header.validate_scope_end(block.end as usize)?;
                    parser.seek(header.end)?;
                    scopes.push(builder.build_block(parser, &block)?);
                    parser.seek(block.end as usize)?;
                }
                Some(
                    kind @ (SymbolKind::ManagedSlot
                    | SymbolKind::ManagedConstant
                    | SymbolKind::UsingNamespace),
                ) => {
                    builder.read_entry(parser, kind)?;
                    parser.seek(header.end)?;
                }
                _ => parser.seek(header.end)?,
            }
        }

        if parser.pos() != body_end {
            return Err(malformed_error!(
                "Body scan for token {} stopped at offset {}, declared end is {}",
                proc.token,
                parser.pos(),
                body_end
            ));
        }

        let terminator = RecordHeader::read(parser)?;
        if SymbolKind::from_value(terminator.kind) != Some(SymbolKind::End) {
            return Err(malformed_error!(
                "Procedure for token {} is not terminated by an end record at offset {} (found kind 0x{:04x})",
                proc.token,
                body_end,
                terminator.kind
            ));
        }

        debug_assert_eq!(builder.slots.len(), counts.slots);
        debug_assert_eq!(builder.constants.len(), counts.constants);
        debug_assert_eq!(builder.namespaces.len(), counts.namespaces);

        Ok(Function {
            token: proc.token,
            segment: proc.segment,
            address: proc.offset,
            len: proc.len,
            flags: proc.flags,
            name: proc.name,
            scopes,
            slots: builder.slots,
            constants: builder.constants,
            namespaces: builder.namespaces,
            using_counts: metadata.using_counts,
            iterator_class: metadata.iterator_class,
            sequence_points: Vec::new(),
        })
    }
}

/// Total order over functions by (segment, address).
///
/// Pure and stateless; the build pass never pre-sorts, so callers needing
/// deterministic address-based lookup apply this themselves:
/// `functions.sort_by(by_address)`.
#[must_use]
pub fn by_address(a: &Function, b: &Function) -> Ordering {
    a.segment
        .cmp(&b.segment)
        .then_with(|| a.address.cmp(&b.address))
}

/// Total order over functions by (segment, address, token).
///
/// Agrees with [`by_address`] whenever segment or address differ; the token
/// breaks ties between functions sharing an address, e.g. after inlining or for
/// identical entry points.
#[must_use]
pub fn by_address_and_token(a: &Function, b: &Function) -> Ordering {
    by_address(a, b).then_with(|| a.token.value().cmp(&b.token.value()))
}

/// Pass 1: scan `[start, limit)` and note the offset of every managed procedure
/// record, skipping each procedure's body via its declared end.
pub(crate) fn collect_procedures(
    data: &[u8],
    start: usize,
    limit: usize,
) -> Result<Vec<usize>> {
    let mut parser = Parser::new(data);
    parser.seek(start)?;

    let mut offsets = Vec::new();
    while parser.pos() < limit {
        let record_start = parser.pos();
        let header = RecordHeader::read(&mut parser)?;
        match SymbolKind::from_value(header.kind) {
            Some(kind) if kind.is_managed_proc() => {
                let _parent = parser.read_le::<u32>()?;
                let end = parser.read_le::<u32>()?;
                header.validate_scope_end(end as usize)?;
                offsets.push(record_start);
                parser.seek(end as usize)?;
            }
            _ => parser.seek(header.end)?,
        }
    }

    Ok(offsets)
}

/// Pass 2, per procedure: re-read the record at `offset` and build its function.
///
/// Each invocation owns its cursor and touches only the object graph of the one
/// function it builds, which is what allows the caller to fan these out in
/// parallel.
pub(crate) fn build_function(data: &[u8], offset: usize, read_strings: bool) -> Result<Function> {
    let mut parser = Parser::new(data);
    parser.seek(offset)?;

    let header = RecordHeader::read(&mut parser)?;
    let proc = ProcedureRecord::read(&mut parser, read_strings)?;
    header.validate_scope_end(proc.end as usize)?;
    parser.seek(header.end)?;

    Function::from_record(proc, &mut parser, read_strings)
}

/// Builds every function whose record start was noted in pass 1, one parallel
/// task per procedure, preserving stream order.
pub(crate) fn build_functions(
    data: &[u8],
    offsets: &[usize],
    read_strings: bool,
) -> Result<Vec<Function>> {
    offsets
        .par_iter()
        .map(|&offset| build_function(data, offset, read_strings))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function_at(segment: u16, address: u32, token: u32) -> Function {
        Function {
            token: Token::new(token),
            segment,
            address,
            len: 0x10,
            flags: ProcFlags::empty(),
            name: None,
            scopes: Vec::new(),
            slots: Vec::new(),
            constants: Vec::new(),
            namespaces: Vec::new(),
            using_counts: None,
            iterator_class: None,
            sequence_points: Vec::new(),
        }
    }

    #[test]
    fn by_address_orders_segment_first() {
        let a = function_at(1, 0x2000, 1);
        let b = function_at(2, 0x1000, 2);

        assert_eq!(by_address(&a, &b), Ordering::Less);
        assert_eq!(by_address(&b, &a), Ordering::Greater);
    }

    #[test]
    fn by_address_orders_by_address_within_segment() {
        let a = function_at(1, 0x1000, 1);
        let b = function_at(1, 0x2000, 2);

        assert_eq!(by_address(&a, &b), Ordering::Less);
        assert_eq!(by_address(&a, &a.clone()), Ordering::Equal);
    }

    #[test]
    fn by_address_and_token_breaks_ties() {
        let a = function_at(1, 0x1000, 0x0600_0001);
        let b = function_at(1, 0x1000, 0x0600_0002);

        assert_eq!(by_address(&a, &b), Ordering::Equal);
        assert_eq!(by_address_and_token(&a, &b), Ordering::Less);
        assert_eq!(by_address_and_token(&b, &a), Ordering::Greater);
    }

    #[test]
    fn comparators_agree_when_addresses_differ() {
        let functions = [
            function_at(1, 0x3000, 5),
            function_at(1, 0x1000, 9),
            function_at(2, 0x0500, 1),
        ];

        for a in &functions {
            for b in &functions {
                if by_address(a, b) != Ordering::Equal {
                    assert_eq!(by_address(a, b), by_address_and_token(a, b));
                }
            }
        }
    }

    #[test]
    fn find_scope_containing_searches_top_level_only() {
        let inner = Scope {
            offset: 0x1004,
            length: 4,
            slots: 0..0,
            constants: 0..0,
            namespaces: 0..0,
            scopes: Vec::new(),
        };
        let top = Scope {
            offset: 0x1000,
            length: 0x10,
            slots: 0..0,
            constants: 0..0,
            namespaces: 0..0,
            scopes: vec![inner],
        };
        let mut function = function_at(1, 0x1000, 1);
        function.scopes = vec![top];

        let found = function.find_scope_containing(0x1006).unwrap();
        assert_eq!(found.offset, 0x1000);
        assert!(function.find_scope_containing(0x2000).is_none());
    }

    #[test]
    fn sequence_points_attach_after_construction() {
        let mut function = function_at(1, 0x1000, 1);
        assert!(function.sequence_points.is_empty());

        function.set_sequence_points(vec![SequencePoint {
            il_offset: 0,
            start_line: 3,
            start_col: 1,
            end_line: 3,
            end_col: 10,
        }]);
        assert_eq!(function.sequence_points.len(), 1);
    }

    #[test]
    fn sequence_point_lookup_picks_governing_point() {
        let point = |il_offset: u32, line: u32| SequencePoint {
            il_offset,
            start_line: line,
            start_col: 1,
            end_line: line,
            end_col: 20,
        };

        let mut function = function_at(1, 0x1000, 1);
        function.set_sequence_points(vec![point(0, 10), point(4, 11), point(12, 13)]);

        assert_eq!(function.sequence_point_at(0).unwrap().start_line, 10);
        assert_eq!(function.sequence_point_at(5).unwrap().start_line, 11);
        assert_eq!(function.sequence_point_at(0x40).unwrap().start_line, 13);

        function.set_sequence_points(vec![point(8, 20)]);
        assert!(function.sequence_point_at(3).is_none());
    }
}
