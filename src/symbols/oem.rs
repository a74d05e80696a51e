//! Managed custom metadata decoder for `S_OEM` records.
//!
//! Managed compilers attach extension data to a procedure through OEM records. Each
//! OEM payload leads with a 16-byte identifier and a type index; when the identifier
//! equals the managed-metadata GUID, the remaining bytes form an `MD2` block:
//!
//! ```text
//! signature:C-string("MD2"), version:u8, itemCount:u8, align(4),
//! itemCount x { version:u8, kind:u8, align(4), totalLen:u32, kind-specific bytes }
//! ```
//!
//! Item kinds this decoder interprets:
//! - **0** - using-namespace counts: a `u16` count, then that many `u16` per-scope
//!   visible-using counts
//! - **3** - iterator locals: a `u32` local count, informational only and discarded
//! - **4** - forward iterator: a length-prefixed string naming the iterator class
//!   the compiler moved this method's body into
//!
//! Every other item kind is tolerated and produces no side effect. Regardless of
//! how many bytes an item decoder consumed, the cursor is forced to
//! `item_start + totalLen` before the next item - the same trust-the-declared-length
//! discipline the record framer applies, at a finer grain.
//!
//! An OEM record whose identifier is not the managed-metadata GUID, or whose
//! signature is not `MD2`, is opaque: decoding stops and the caller's generic
//! record reseek skips the rest. A version other than 4 is fatal
//! ([`crate::Error::UnsupportedVersion`]) - it signals a producer whose layout
//! this decoder cannot navigate.

use uguid::{guid, Guid};

use crate::{file::parser::Parser, Error, Result};

/// Identifier designating managed metadata in an OEM record.
pub(crate) const MANAGED_METADATA_GUID: Guid = guid!("c6ea3fc9-59b3-49d6-bc25-0902bbabb460");

/// Signature string opening a managed metadata block.
const MD2_SIGNATURE: &str = "MD2";

/// The only managed metadata version this decoder understands.
const MD2_VERSION: u8 = 4;

/// Compiler-specific extension data decoded from a procedure's OEM records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct CustomMetadata {
    /// Per-scope counts of visible leading using-entries
    pub using_counts: Option<Vec<u16>>,
    /// Name of the compiler-generated iterator class holding this method's body
    pub iterator_class: Option<String>,
}

/// Decode the payload of one `S_OEM` record into `metadata`.
///
/// The cursor must sit immediately after the record frame. On return the cursor is
/// wherever decoding stopped; the caller reseeks to the record's declared end, so
/// partially consumed or unrecognized payloads cause no drift.
///
/// # Errors
/// Returns [`crate::Error::UnsupportedVersion`] for a managed metadata block or
/// item with a version other than 4, or [`crate::Error::OutOfBounds`] if the
/// payload is truncated.
pub(crate) fn decode_oem(parser: &mut Parser, metadata: &mut CustomMetadata) -> Result<()> {
    let id = parser.read_guid()?;
    let _type_index = parser.read_le::<u32>()?;

    if id != MANAGED_METADATA_GUID {
        // Unknown vendor payload, skipped by the caller's record reseek
        return Ok(());
    }

    let signature = parser.read_string_utf8()?;
    if signature != MD2_SIGNATURE {
        return Ok(());
    }

    let version = parser.read_le::<u8>()?;
    if version != MD2_VERSION {
        return Err(Error::UnsupportedVersion(version));
    }

    let count = parser.read_le::<u8>()?;
    parser.align(4)?;

    for _ in 0..count {
        read_item(parser, metadata)?;
    }

    Ok(())
}

/// Decode one length-framed metadata item.
fn read_item(parser: &mut Parser, metadata: &mut CustomMetadata) -> Result<()> {
    let item_start = parser.pos();

    let version = parser.read_le::<u8>()?;
    if version != MD2_VERSION {
        return Err(Error::UnsupportedVersion(version));
    }

    let kind = parser.read_le::<u8>()?;
    parser.align(4)?;
    let total_length = parser.read_le::<u32>()? as usize;

    match kind {
        0 => {
            let count = parser.read_le::<u16>()?;
            let mut using_counts = Vec::with_capacity(count as usize);
            for _ in 0..count {
                using_counts.push(parser.read_le::<u16>()?);
            }
            metadata.using_counts = Some(using_counts);
        }
        3 => {
            // Iterator local count, informational only
            let _locals = parser.read_le::<u32>()?;
        }
        4 => {
            metadata.iterator_class = Some(parser.read_prefixed_string_utf8()?);
        }
        _ => {}
    }

    parser.seek(item_start + total_length)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn md2_prefix(version: u8, item_count: u8) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&MANAGED_METADATA_GUID.to_bytes());
        data.extend_from_slice(&0u32.to_le_bytes()); // type index
        data.extend_from_slice(b"MD2\0");
        data.push(version);
        data.push(item_count);
        while data.len() % 4 != 0 {
            data.push(0);
        }
        data
    }

    fn item(kind: u8, body: &[u8]) -> Vec<u8> {
        // version, kind, align(4), total length, body; item start is 4-aligned
        let mut data = vec![MD2_VERSION, kind, 0, 0];
        let total = (data.len() + 4 + body.len()) as u32;
        data.extend_from_slice(&total.to_le_bytes());
        data.extend_from_slice(body);
        data
    }

    #[test]
    fn foreign_guid_is_opaque() {
        let mut data = Vec::new();
        data.extend_from_slice(&guid!("00010203-0405-0607-0809-0a0b0c0d0e0f").to_bytes());
        data.extend_from_slice(&7u32.to_le_bytes());
        data.extend_from_slice(b"not MD2 at all");

        let mut parser = Parser::new(&data);
        let mut metadata = CustomMetadata::default();
        decode_oem(&mut parser, &mut metadata).unwrap();

        assert_eq!(metadata, CustomMetadata::default());
        // Decoding stopped right after the identifier and type index
        assert_eq!(parser.pos(), 20);
    }

    #[test]
    fn wrong_signature_is_opaque() {
        let mut data = Vec::new();
        data.extend_from_slice(&MANAGED_METADATA_GUID.to_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(b"asyncMethodInfo\0rest");

        let mut parser = Parser::new(&data);
        let mut metadata = CustomMetadata::default();
        decode_oem(&mut parser, &mut metadata).unwrap();

        assert_eq!(metadata, CustomMetadata::default());
    }

    #[test]
    fn unsupported_version_is_fatal() {
        let data = md2_prefix(5, 0);

        let mut parser = Parser::new(&data);
        let mut metadata = CustomMetadata::default();
        assert!(matches!(
            decode_oem(&mut parser, &mut metadata),
            Err(Error::UnsupportedVersion(5))
        ));
    }

    #[test]
    fn zero_items_consume_count_and_padding_only() {
        let mut data = md2_prefix(MD2_VERSION, 0);
        let aligned_end = data.len();
        data.extend_from_slice(&[0xAA; 8]); // trailing bytes must stay untouched

        let mut parser = Parser::new(&data);
        let mut metadata = CustomMetadata::default();
        decode_oem(&mut parser, &mut metadata).unwrap();

        assert_eq!(parser.pos(), aligned_end);
        assert_eq!(metadata, CustomMetadata::default());
    }

    #[test]
    fn using_counts_item() {
        let mut body = Vec::new();
        body.extend_from_slice(&3u16.to_le_bytes());
        body.extend_from_slice(&1u16.to_le_bytes());
        body.extend_from_slice(&0u16.to_le_bytes());
        body.extend_from_slice(&2u16.to_le_bytes());

        let mut data = md2_prefix(MD2_VERSION, 1);
        data.extend_from_slice(&item(0, &body));

        let mut parser = Parser::new(&data);
        let mut metadata = CustomMetadata::default();
        decode_oem(&mut parser, &mut metadata).unwrap();

        assert_eq!(metadata.using_counts, Some(vec![1, 0, 2]));
    }

    #[test]
    fn forward_iterator_item() {
        let name = "Namespace.Type+<Iterate>d__0";
        let mut body = Vec::new();
        body.extend_from_slice(&(name.len() as u16).to_le_bytes());
        body.extend_from_slice(name.as_bytes());

        let mut data = md2_prefix(MD2_VERSION, 1);
        data.extend_from_slice(&item(4, &body));

        let mut parser = Parser::new(&data);
        let mut metadata = CustomMetadata::default();
        decode_oem(&mut parser, &mut metadata).unwrap();

        assert_eq!(metadata.iterator_class.as_deref(), Some(name));
    }

    #[test]
    fn iterator_locals_item_is_discarded() {
        let mut data = md2_prefix(MD2_VERSION, 1);
        data.extend_from_slice(&item(3, &6u32.to_le_bytes()));

        let mut parser = Parser::new(&data);
        let mut metadata = CustomMetadata::default();
        decode_oem(&mut parser, &mut metadata).unwrap();

        assert_eq!(metadata, CustomMetadata::default());
    }

    #[test]
    fn unknown_item_kind_is_skipped_by_length() {
        // First an unknown kind with garbage body, then a using item; the declared
        // item length must carry the cursor over the garbage.
        let mut data = md2_prefix(MD2_VERSION, 2);
        data.extend_from_slice(&item(9, &[0xDE, 0xAD, 0xBE, 0xEF]));

        let mut body = Vec::new();
        body.extend_from_slice(&1u16.to_le_bytes());
        body.extend_from_slice(&4u16.to_le_bytes());
        data.extend_from_slice(&item(0, &body));

        let mut parser = Parser::new(&data);
        let mut metadata = CustomMetadata::default();
        decode_oem(&mut parser, &mut metadata).unwrap();

        assert_eq!(metadata.using_counts, Some(vec![4]));
    }

    #[test]
    fn item_version_mismatch_is_fatal() {
        let mut data = md2_prefix(MD2_VERSION, 1);
        data.extend_from_slice(&item(0, &0u16.to_le_bytes()));
        // Corrupt the item's version byte
        let item_start = data.len() - 10;
        data[item_start] = 3;

        let mut parser = Parser::new(&data);
        let mut metadata = CustomMetadata::default();
        assert!(matches!(
            decode_oem(&mut parser, &mut metadata),
            Err(Error::UnsupportedVersion(3))
        ));
    }
}
