//! Raw record framing and fixed-layout payloads of the managed symbol stream.
//!
//! Every symbol record is self-framed: a 16-bit size (counting everything after the
//! size field itself, including the kind tag), a 16-bit kind, then the payload. The
//! types in this module read that frame and the fixed headers of the records the
//! decoder interprets. Higher layers own the discipline of reseeking to a record's
//! declared end after payload parsing - that reseek, not the payload shape, is what
//! keeps the cursor on the record grid when a payload is unknown or only partially
//! understood.
//!
//! # Key Components
//!
//! - [`crate::symbols::records::RecordHeader`] - The `(size, kind)` frame of every record
//! - [`crate::symbols::records::ProcedureRecord`] - `S_GMANPROC`/`S_LMANPROC` payload
//! - [`crate::symbols::records::BlockRecord`] - `S_BLOCK32` payload
//! - [`crate::symbols::records::ProcFlags`] - `CV_PROCFLAGS` bit field

use bitflags::bitflags;

use crate::{file::parser::Parser, symbols::token::Token, Result};

/// The frame every symbol record starts with: a size and a kind tag.
///
/// `end` is the absolute stream offset immediately after the record, computed as
/// `position_after_size + size`. After any payload parsing, including recursive
/// descent into nested records, the cursor must be explicitly repositioned to
/// `end` before the next record is read. This holds even if the payload parser
/// consumed fewer or more fields than the byte count implies, and is the sole
/// defense against drift caused by unrecognized payload shapes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RecordHeader {
    /// Raw record kind tag; resolved via [`crate::symbols::kind::SymbolKind::from_value`]
    pub kind: u16,
    /// Absolute offset of the first byte after this record
    pub end: usize,
}

impl RecordHeader {
    /// Read a record frame at the current cursor position.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the declared size cannot cover the kind
    /// tag, or [`crate::Error::OutOfBounds`] if the frame itself is truncated.
    pub(crate) fn read(parser: &mut Parser) -> Result<RecordHeader> {
        let offset = parser.pos();
        let size = parser.read_le::<u16>()?;
        if size < 2 {
            return Err(malformed_error!(
                "Symbol record at offset {} declares size {}, minimum is 2",
                offset,
                size
            ));
        }

        let end = parser.pos() + size as usize;
        if end > parser.len() {
            return Err(out_of_bounds_error!());
        }

        let kind = parser.read_le::<u16>()?;
        Ok(RecordHeader { kind, end })
    }

    /// Validates the scope end offset a procedure or block record declares.
    ///
    /// The terminating end record always sits at or after the declaring record's
    /// own frame end; a smaller value would move the scanner backwards onto
    /// records it has already consumed.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `scope_end` lies before this record's
    /// frame end.
    pub(crate) fn validate_scope_end(&self, scope_end: usize) -> Result<()> {
        if scope_end < self.end {
            return Err(malformed_error!(
                "Record ending at offset {} declares scope end {}, which points backwards",
                self.end,
                scope_end
            ));
        }
        Ok(())
    }
}

bitflags! {
    /// Flags describing a procedure symbol.
    ///
    /// See `CV_PROCFLAGS` in `cvinfo.h`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ProcFlags: u8 {
        /// Frame pointer present
        const NOFPO = 1 << 0;
        /// Interrupt return
        const INT = 1 << 1;
        /// Far return
        const FAR = 1 << 2;
        /// Does not return
        const NEVER = 1 << 3;
        /// Label not reached
        const NOTREACHED = 1 << 4;
        /// Custom calling convention
        const CUST_CALL = 1 << 5;
        /// Marked `noinline`
        const NOINLINE = 1 << 6;
        /// Has debug information for optimized code
        const OPTDBGINFO = 1 << 7;
    }
}

/// The payload of an `S_GMANPROC` or `S_LMANPROC` record.
///
/// Wire layout: `parent:u32, end:u32, next:u32, len:u32, dbgStart:u32, dbgEnd:u32,
/// token:u32, off:u32, seg:u16, flags:u8, retReg:u16, name:C-string`.
///
/// `end` is the absolute stream offset of the `S_END` record that closes the
/// procedure's scope. It is distinct from the generic record-size end: the records
/// between this record's frame end and `end` form the procedure body.
#[derive(Debug, Clone)]
pub struct ProcedureRecord {
    /// Parent scope link; always 0 for managed procedures
    pub parent: u32,
    /// Absolute stream offset of the terminating `S_END` record
    pub end: u32,
    /// Next procedure link; always 0 for managed procedures
    pub next: u32,
    /// Length in bytes of the procedure's code
    pub len: u32,
    /// Offset from procedure start where the stack frame is set up
    pub dbg_start: u32,
    /// Offset from procedure start where the return value is ready
    pub dbg_end: u32,
    /// Metadata token of the method this procedure implements
    pub token: Token,
    /// Offset of the procedure within its segment
    pub offset: u32,
    /// Segment id; managed code lives in segment 1
    pub segment: u16,
    /// Procedure flags
    pub flags: ProcFlags,
    /// Register holding the return value
    pub return_reg: u16,
    /// Procedure name; [`None`] when string materialization was disabled
    pub name: Option<String>,
}

impl ProcedureRecord {
    /// Read a procedure payload at the current cursor position.
    ///
    /// # Arguments
    /// * `parser` - Cursor positioned immediately after the record frame
    /// * `read_strings` - Whether to materialize the procedure name or only skip it
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the payload is truncated, or
    /// [`crate::Error::Malformed`] if the name is not valid UTF-8.
    pub(crate) fn read(parser: &mut Parser, read_strings: bool) -> Result<ProcedureRecord> {
        let parent = parser.read_le::<u32>()?;
        let end = parser.read_le::<u32>()?;
        let next = parser.read_le::<u32>()?;
        let len = parser.read_le::<u32>()?;
        let dbg_start = parser.read_le::<u32>()?;
        let dbg_end = parser.read_le::<u32>()?;
        let token = Token::new(parser.read_le::<u32>()?);
        let offset = parser.read_le::<u32>()?;
        let segment = parser.read_le::<u16>()?;
        let flags = ProcFlags::from_bits_retain(parser.read_le::<u8>()?);
        let return_reg = parser.read_le::<u16>()?;
        let name = if read_strings {
            Some(parser.read_string_utf8()?)
        } else {
            parser.skip_string_utf8();
            None
        };

        Ok(ProcedureRecord {
            parent,
            end,
            next,
            len,
            dbg_start,
            dbg_end,
            token,
            offset,
            segment,
            flags,
            return_reg,
            name,
        })
    }
}

/// The payload of an `S_BLOCK32` record describing a nested lexical scope.
///
/// Wire layout: `parent:u32, end:u32, len:u32, off:u32, seg:u16, name:C-string`.
///
/// Like procedures, blocks carry an explicit `end`: the absolute stream offset of
/// the `S_END` record closing the block. The block's own contents sit between the
/// block record's frame end and that offset. The parent link, segment, and name
/// carry no information for managed blocks and are skipped over without being
/// materialized.
#[derive(Debug, Clone)]
pub(crate) struct BlockRecord {
    /// Absolute stream offset of the terminating `S_END` record
    pub end: u32,
    /// Length in bytes of the address range the block covers
    pub len: u32,
    /// Offset of the block start within its segment
    pub offset: u32,
}

impl BlockRecord {
    /// Read a block payload at the current cursor position.
    pub(crate) fn read(parser: &mut Parser) -> Result<BlockRecord> {
        let _parent = parser.read_le::<u32>()?;
        let end = parser.read_le::<u32>()?;
        let len = parser.read_le::<u32>()?;
        let offset = parser.read_le::<u32>()?;
        let _segment = parser.read_le::<u16>()?;
        parser.skip_string_utf8();

        Ok(BlockRecord { end, len, offset })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_header_frames_payload() {
        // size = 6 counts the kind tag plus 4 payload bytes
        let data = [0x06, 0x00, 0x03, 0x11, 0xAA, 0xBB, 0xCC, 0xDD];
        let mut parser = Parser::new(&data);

        let header = RecordHeader::read(&mut parser).unwrap();
        assert_eq!(header.kind, 0x1103);
        assert_eq!(header.end, 8);
        assert_eq!(parser.pos(), 4);
    }

    #[test]
    fn record_header_size_below_minimum() {
        let data = [0x01, 0x00, 0x06, 0x00];
        let mut parser = Parser::new(&data);

        assert!(matches!(
            RecordHeader::read(&mut parser),
            Err(crate::Error::Malformed { .. })
        ));
    }

    #[test]
    fn record_header_overruns_stream() {
        // Declares 16 bytes after the size field but only 2 exist
        let data = [0x10, 0x00, 0x06, 0x00];
        let mut parser = Parser::new(&data);

        assert!(matches!(
            RecordHeader::read(&mut parser),
            Err(crate::Error::OutOfBounds)
        ));
    }

    #[test]
    fn procedure_record_read() {
        let mut data = Vec::new();
        data.extend_from_slice(&0u32.to_le_bytes()); // parent
        data.extend_from_slice(&0x80u32.to_le_bytes()); // end
        data.extend_from_slice(&0u32.to_le_bytes()); // next
        data.extend_from_slice(&0x40u32.to_le_bytes()); // len
        data.extend_from_slice(&4u32.to_le_bytes()); // dbg_start
        data.extend_from_slice(&0x3Cu32.to_le_bytes()); // dbg_end
        data.extend_from_slice(&0x0600_0001u32.to_le_bytes()); // token
        data.extend_from_slice(&0x1000u32.to_le_bytes()); // offset
        data.extend_from_slice(&1u16.to_le_bytes()); // segment
        data.push(0x80); // flags: OPTDBGINFO
        data.extend_from_slice(&0u16.to_le_bytes()); // return_reg
        data.extend_from_slice(b"Main\0");

        let mut parser = Parser::new(&data);
        let proc = ProcedureRecord::read(&mut parser, true).unwrap();

        assert_eq!(proc.end, 0x80);
        assert_eq!(proc.len, 0x40);
        assert_eq!(proc.token.value(), 0x0600_0001);
        assert_eq!(proc.offset, 0x1000);
        assert_eq!(proc.segment, 1);
        assert!(proc.flags.contains(ProcFlags::OPTDBGINFO));
        assert_eq!(proc.name.as_deref(), Some("Main"));
        assert_eq!(parser.pos(), data.len());
    }

    #[test]
    fn procedure_record_skips_name() {
        let mut data = Vec::new();
        data.extend_from_slice(&[0u8; 24]); // parent..dbg_end
        data.extend_from_slice(&0x0600_0002u32.to_le_bytes()); // token
        data.extend_from_slice(&0u32.to_le_bytes()); // offset
        data.extend_from_slice(&1u16.to_le_bytes()); // segment
        data.push(0); // flags
        data.extend_from_slice(&0u16.to_le_bytes()); // return_reg
        data.extend_from_slice(b"Skipped\0");

        let mut parser = Parser::new(&data);
        let proc = ProcedureRecord::read(&mut parser, false).unwrap();

        assert_eq!(proc.name, None);
        assert_eq!(parser.pos(), data.len());
    }

    #[test]
    fn block_record_read() {
        let mut data = Vec::new();
        data.extend_from_slice(&0u32.to_le_bytes()); // parent
        data.extend_from_slice(&0x60u32.to_le_bytes()); // end
        data.extend_from_slice(&0x10u32.to_le_bytes()); // len
        data.extend_from_slice(&0x1008u32.to_le_bytes()); // offset
        data.extend_from_slice(&1u16.to_le_bytes()); // segment
        data.extend_from_slice(b"\0");

        let mut parser = Parser::new(&data);
        let block = BlockRecord::read(&mut parser).unwrap();

        assert_eq!(block.end, 0x60);
        assert_eq!(block.len, 0x10);
        assert_eq!(block.offset, 0x1008);
        assert_eq!(parser.pos(), data.len());
    }

    #[test]
    fn scope_end_must_not_point_backwards() {
        // size = 6 covers the kind tag plus 4 payload bytes; frame end is 8
        let data = [0x06, 0x00, 0x03, 0x11, 0, 0, 0, 0];
        let mut parser = Parser::new(&data);
        let header = RecordHeader::read(&mut parser).unwrap();

        assert!(header.validate_scope_end(8).is_ok());
        assert!(header.validate_scope_end(12).is_ok());
        assert!(matches!(
            header.validate_scope_end(0),
            Err(crate::Error::Malformed { .. })
        ));
        assert!(matches!(
            header.validate_scope_end(3),
            Err(crate::Error::Malformed { .. })
        ));
    }
}
