//! Fixed-width slot codec.
//!
//! A slot payload is the record's fields joined by the separator and
//! right-padded with spaces to the slot width. The newline terminator that
//! follows each payload on disk is owned by the slot file, not by this
//! codec, so an in-place rewrite can never touch it.

use super::{Record, FIELD_SEPARATOR, TIMESTAMP_FORMAT};
use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;

/// Encode a record into a slot payload of exactly `width` bytes.
///
/// Fails with [`Error::Encoding`] if a field contains the separator or a
/// line break, or if the unpadded encoding exceeds `width`. Values are
/// never truncated.
pub fn encode_record<R: Record>(record: &R, width: usize) -> Result<Vec<u8>> {
    let fields = record.to_fields();

    for field in &fields {
        if field.contains(FIELD_SEPARATOR) {
            return Err(Error::encoding(format!(
                "field {:?} contains the separator {:?}",
                field, FIELD_SEPARATOR
            )));
        }
        if field.contains('\n') || field.contains('\r') {
            return Err(Error::encoding(format!(
                "field {:?} contains a line break",
                field
            )));
        }
    }

    let joined = fields.join(&FIELD_SEPARATOR.to_string());
    if joined.len() > width {
        return Err(Error::encoding(format!(
            "record {:?} encodes to {} bytes, exceeding slot width {}",
            record.key(),
            joined.len(),
            width
        )));
    }

    let mut payload = joined.into_bytes();
    payload.resize(width, b' ');
    Ok(payload)
}

/// Decode a slot payload back into a record.
///
/// Trailing padding (and a trailing terminator, if the caller passed a whole
/// stride) is trimmed before the fields are split and parsed.
pub fn decode_record<R: Record>(payload: &[u8]) -> Result<R> {
    let text = std::str::from_utf8(payload)
        .map_err(|e| Error::decoding(format!("slot is not valid UTF-8: {}", e)))?;
    let trimmed = text.trim_end_matches(['\n', ' ']);
    let fields: Vec<&str> = trimmed.split(FIELD_SEPARATOR).collect();
    R::from_fields(&fields)
}

/// Checks the decoded field count against the record's schema.
pub(crate) fn expect_fields(fields: &[&str], expected: usize, what: &str) -> Result<()> {
    if fields.len() != expected {
        return Err(Error::decoding(format!(
            "{} record has {} fields, expected {}",
            what,
            fields.len(),
            expected
        )));
    }
    Ok(())
}

/// Parse an integer field.
pub(crate) fn parse_int(field: &str, name: &str) -> Result<i64> {
    field
        .parse()
        .map_err(|e| Error::decoding(format!("field {}: {:?} is not an integer: {}", name, field, e)))
}

/// Parse a decimal field.
pub(crate) fn parse_decimal(field: &str, name: &str) -> Result<Decimal> {
    field
        .parse()
        .map_err(|e| Error::decoding(format!("field {}: {:?} is not a decimal: {}", name, field, e)))
}

/// Parse a timestamp field.
pub(crate) fn parse_timestamp(field: &str, name: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(field, TIMESTAMP_FORMAT).map_err(|e| {
        Error::decoding(format!(
            "field {}: {:?} is not a {} timestamp: {}",
            name, field, TIMESTAMP_FORMAT, e
        ))
    })
}
