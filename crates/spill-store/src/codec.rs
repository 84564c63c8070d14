//! Row record encode/decode.
//!
//! Record layout: one little-endian `i64` per column giving the encoded cell
//! length (`-1` marks NULL), followed by the non-null cell payloads in column
//! order. The length header lets [`decode_row`] slice the payload in a single
//! pass over a bounded byte range; there is no trailing delimiter, the caller
//! bounds the record with the offset table.

use crate::error::SpillError;
use crate::row::{Datum, FieldType, Row};

/// Length-header sentinel marking a NULL cell.
const NULL_SENTINEL: i64 = -1;
/// Bytes per length-header entry.
const HEADER_ENTRY_SIZE: usize = 8;
/// Encoded size of a fixed-width cell.
const FIXED_CELL_SIZE: usize = 8;

/// Appends the record for `row` to `out`.
///
/// The caller guarantees `row` conforms to `fields`; the schema is fixed per
/// list and not re-verified per record.
#[allow(clippy::cast_possible_wrap)] // cell lengths are far below i64::MAX
pub(crate) fn encode_row(
    row: &[Datum],
    fields: &[FieldType],
    out: &mut Vec<u8>,
) -> Result<(), SpillError> {
    debug_assert_eq!(row.len(), fields.len());

    let header_start = out.len();
    out.resize(header_start + row.len() * HEADER_ENTRY_SIZE, 0);

    for (col, datum) in row.iter().enumerate() {
        let len = match datum {
            Datum::Null => NULL_SENTINEL,
            Datum::Int64(v) => {
                out.extend_from_slice(&v.to_le_bytes());
                FIXED_CELL_SIZE as i64
            }
            Datum::Float64(v) => {
                out.extend_from_slice(&v.to_bits().to_le_bytes());
                FIXED_CELL_SIZE as i64
            }
            Datum::Bytes(b) => {
                out.extend_from_slice(b);
                b.len() as i64
            }
            Datum::String(s) => {
                out.extend_from_slice(s.as_bytes());
                s.len() as i64
            }
            Datum::Json(v) => {
                let bytes = serde_json::to_vec(v).map_err(|e| {
                    SpillError::CorruptRecord(format!("JSON cell in column {col} failed to encode: {e}"))
                })?;
                out.extend_from_slice(&bytes);
                bytes.len() as i64
            }
        };
        let slot = header_start + col * HEADER_ENTRY_SIZE;
        out[slot..slot + HEADER_ENTRY_SIZE].copy_from_slice(&len.to_le_bytes());
    }
    Ok(())
}

/// Decodes one row from `bytes` according to `fields`.
///
/// Bytes past the last cell are ignored; the caller bounds the range.
pub(crate) fn decode_row(bytes: &[u8], fields: &[FieldType]) -> Result<Row, SpillError> {
    let header_len = fields.len() * HEADER_ENTRY_SIZE;
    if bytes.len() < header_len {
        return Err(SpillError::CorruptRecord(format!(
            "record of {} bytes is too short for a {header_len}-byte length header",
            bytes.len()
        )));
    }

    let mut cursor = header_len;
    let mut datums = Vec::with_capacity(fields.len());
    for (col, ty) in fields.iter().enumerate() {
        let slot = col * HEADER_ENTRY_SIZE;
        let mut raw = [0u8; HEADER_ENTRY_SIZE];
        raw.copy_from_slice(&bytes[slot..slot + HEADER_ENTRY_SIZE]);
        let raw = i64::from_le_bytes(raw);

        if raw == NULL_SENTINEL {
            datums.push(Datum::Null);
            continue;
        }
        let len = usize::try_from(raw).map_err(|_| {
            SpillError::CorruptRecord(format!("invalid cell length {raw} in column {col}"))
        })?;
        let end = cursor.checked_add(len).filter(|end| *end <= bytes.len()).ok_or_else(|| {
            SpillError::CorruptRecord(format!("cell in column {col} extends past the record end"))
        })?;
        let cell = &bytes[cursor..end];
        cursor = end;

        let datum = match ty {
            FieldType::Int64 | FieldType::Float64 => {
                if len != FIXED_CELL_SIZE {
                    return Err(SpillError::CorruptRecord(format!(
                        "fixed-width cell in column {col} has length {len}"
                    )));
                }
                let mut fixed = [0u8; FIXED_CELL_SIZE];
                fixed.copy_from_slice(cell);
                match ty {
                    FieldType::Int64 => Datum::Int64(i64::from_le_bytes(fixed)),
                    _ => Datum::Float64(f64::from_bits(u64::from_le_bytes(fixed))),
                }
            }
            FieldType::Bytes => Datum::Bytes(cell.to_vec()),
            FieldType::String => {
                let s = std::str::from_utf8(cell).map_err(|e| {
                    SpillError::CorruptRecord(format!("invalid UTF-8 in column {col}: {e}"))
                })?;
                Datum::String(s.to_owned())
            }
            FieldType::Json => {
                let v = serde_json::from_slice(cell).map_err(|e| {
                    SpillError::CorruptRecord(format!("invalid JSON in column {col}: {e}"))
                })?;
                Datum::Json(v)
            }
        };
        datums.push(datum);
    }
    Ok(Row::new(datums))
}
