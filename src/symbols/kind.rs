//! Record kind tags of the managed symbol stream.

use strum::{EnumCount, EnumIter};

/// Identifiers for the CodeView symbol record kinds this decoder dispatches on.
///
/// Each variant represents a specific record kind that can appear in the managed
/// symbol sub-stream of a PDB file. The numeric values correspond to the record
/// type tags defined in `cvinfo.h`.
///
/// The managed symbol stream contains many more historical record kinds than the
/// ones listed here; anything not in this enum is deliberately treated as opaque
/// and skipped via its declared record size. This keeps the decoder forward
/// compatible with producers that emit newer record kinds.
///
/// ## Record Categories
///
/// ### Framing
/// - **`End`**: Terminates a procedure or block scope
///
/// ### Procedures
/// - **`GlobalManagedProc`**: Managed procedure with external linkage
/// - **`LocalManagedProc`**: Managed procedure with internal linkage
///
/// ### Scope Contents
/// - **`Block`**: Nested lexical scope within a procedure
/// - **`ManagedSlot`**: Local variable slot description
/// - **`ManagedConstant`**: Compile-time constant
/// - **`UsingNamespace`**: Namespace imported into the enclosing scope
///
/// ### Extensions
/// - **`Oem`**: Vendor extension record; carries managed custom metadata when tagged
///   with the managed-metadata identifier
///
/// ## Reference
/// * [`cvinfo.h`](https://github.com/microsoft/microsoft-pdb/blob/master/include/cvinfo.h) - `SYM_ENUM_e`
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, EnumIter, EnumCount)]
#[repr(u16)]
pub enum SymbolKind {
    /// `S_END` (0x0006) - Block, procedure, or thunk end marker.
    ///
    /// Every procedure and block scope is terminated by one of these; the enclosing
    /// record's declared end offset points directly at it.
    End = 0x0006,

    /// `S_OEM` (0x0404) - OEM-defined extension record.
    ///
    /// Leads with a 16-byte identifier naming the payload format. The managed
    /// compilers use this to attach `MD2` custom metadata to a procedure.
    Oem = 0x0404,

    /// `S_BLOCK32` (0x1103) - Nested lexical block scope.
    ///
    /// Carries its own end offset; the records between the block record and that
    /// offset describe the block's contents, recursively.
    Block = 0x1103,

    /// `S_MANSLOT` (0x1120) - Managed local variable slot.
    ManagedSlot = 0x1120,

    /// `S_UNAMESPACE` (0x1124) - Using-namespace declaration.
    UsingNamespace = 0x1124,

    /// `S_GMANPROC` (0x112a) - Global managed procedure start.
    GlobalManagedProc = 0x112A,

    /// `S_LMANPROC` (0x112b) - Local managed procedure start.
    LocalManagedProc = 0x112B,

    /// `S_MANCONSTANT` (0x112d) - Managed compile-time constant.
    ManagedConstant = 0x112D,
}

impl SymbolKind {
    /// Maps a raw record tag to a [`SymbolKind`], or [`None`] for kinds this decoder
    /// does not interpret.
    ///
    /// Unknown tags are not an error; the record framer skips them to their declared
    /// end, so `None` routes a record into the skip path.
    #[must_use]
    pub fn from_value(value: u16) -> Option<SymbolKind> {
        match value {
            0x0006 => Some(SymbolKind::End),
            0x0404 => Some(SymbolKind::Oem),
            0x1103 => Some(SymbolKind::Block),
            0x1120 => Some(SymbolKind::ManagedSlot),
            0x1124 => Some(SymbolKind::UsingNamespace),
            0x112A => Some(SymbolKind::GlobalManagedProc),
            0x112B => Some(SymbolKind::LocalManagedProc),
            0x112D => Some(SymbolKind::ManagedConstant),
            _ => None,
        }
    }

    /// Returns `true` for the two managed procedure record kinds.
    #[must_use]
    pub fn is_managed_proc(self) -> bool {
        matches!(
            self,
            SymbolKind::GlobalManagedProc | SymbolKind::LocalManagedProc
        )
    }
}
