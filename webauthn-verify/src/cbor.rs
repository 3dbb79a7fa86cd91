//! CBOR decoding helpers for attestation objects
//!
//! Semantic decoding goes through `cbor4ii` with serde; this module adds the
//! byte-level discipline the wire format needs: measuring the exact encoded
//! length of one CBOR item (to delimit the COSE key inside authenticator data
//! and to reject trailing garbage) and pulling typed fields out of the opaque
//! attestation statement map.

use cbor4ii::core::Value;
use serde::Deserialize;

use crate::error::{Result, VerifyError};

/// Nesting bound for item scanning; WebAuthn structures are shallow
const MAX_DEPTH: u8 = 8;

/// Attestation object as it appears on the wire
#[derive(Debug, Clone)]
pub(crate) struct RawAttestationObject {
    pub(crate) fmt: String,
    pub(crate) auth_data: Vec<u8>,
    pub(crate) att_stmt: Vec<(Value, Value)>,
}

#[derive(Deserialize)]
struct WireAttestationObject {
    fmt: String,
    #[serde(rename = "attStmt")]
    att_stmt: Value,
    #[serde(rename = "authData", with = "serde_bytes")]
    auth_data: Vec<u8>,
}

impl RawAttestationObject {
    /// Decode the top-level attestation object map
    ///
    /// The buffer must hold exactly one CBOR map; trailing bytes fail.
    pub(crate) fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.first().map(|b| b >> 5) != Some(5) {
            return Err(VerifyError::Decode("attestation object is not a CBOR map"));
        }
        if item_len(data)? != data.len() {
            return Err(VerifyError::Decode("trailing bytes after attestation object"));
        }

        let wire: WireAttestationObject = cbor4ii::serde::from_slice(data)
            .map_err(|_| VerifyError::Decode("malformed attestation object"))?;
        let att_stmt = match wire.att_stmt {
            Value::Map(entries) => entries,
            _ => return Err(VerifyError::Decode("attestation statement is not a map")),
        };

        Ok(Self {
            fmt: wire.fmt,
            auth_data: wire.auth_data,
            att_stmt,
        })
    }
}

/// Exact encoded length of the CBOR item starting at `data[0]`
///
/// Walks headers left-to-right with bounds checks; indefinite lengths and
/// reserved additional-info values are malformed here (WebAuthn requires
/// definite, canonical encodings).
pub(crate) fn item_len(data: &[u8]) -> Result<usize> {
    item_len_inner(data, 0)
}

fn item_len_inner(data: &[u8], depth: u8) -> Result<usize> {
    if depth > MAX_DEPTH {
        return Err(VerifyError::Decode("CBOR nesting too deep"));
    }

    let (major, arg, header_len) = read_header(data)?;
    match major {
        // Integers carry no payload beyond the header
        0 | 1 => Ok(header_len),
        // Byte and text strings
        2 | 3 => {
            let len = usize::try_from(arg)
                .ok()
                .and_then(|l| l.checked_add(header_len))
                .ok_or(VerifyError::Decode("CBOR length overflow"))?;
            if len > data.len() {
                return Err(VerifyError::Decode("truncated CBOR string"));
            }
            Ok(len)
        }
        // Arrays and maps: walk each nested item
        4 | 5 => {
            let items = if major == 5 {
                arg.checked_mul(2)
                    .ok_or(VerifyError::Decode("CBOR length overflow"))?
            } else {
                arg
            };
            let mut offset = header_len;
            for _ in 0..items {
                if offset > data.len() {
                    return Err(VerifyError::Decode("truncated CBOR container"));
                }
                let nested = item_len_inner(&data[offset..], depth + 1)?;
                offset = offset
                    .checked_add(nested)
                    .ok_or(VerifyError::Decode("CBOR length overflow"))?;
            }
            Ok(offset)
        }
        // Tag wraps exactly one item
        6 => {
            if header_len > data.len() {
                return Err(VerifyError::Decode("truncated CBOR tag"));
            }
            let nested = item_len_inner(&data[header_len..], depth + 1)?;
            header_len
                .checked_add(nested)
                .ok_or(VerifyError::Decode("CBOR length overflow"))
        }
        // Simple values and floats
        7 => Ok(header_len),
        _ => unreachable!("major type is 3 bits"),
    }
}

/// Read one CBOR item header: (major type, argument, header length)
fn read_header(data: &[u8]) -> Result<(u8, u64, usize)> {
    let initial = *data
        .first()
        .ok_or(VerifyError::Decode("unexpected end of CBOR input"))?;
    let major = initial >> 5;
    let info = initial & 0x1f;

    let needed = match info {
        0..=23 => return Ok((major, u64::from(info), 1)),
        24 => 1usize,
        25 => 2,
        26 => 4,
        27 => 8,
        // 28-30 reserved, 31 indefinite
        _ => return Err(VerifyError::Decode("malformed CBOR additional info")),
    };
    if data.len() < 1 + needed {
        return Err(VerifyError::Decode("truncated CBOR header"));
    }
    let mut arg = 0u64;
    for &byte in &data[1..1 + needed] {
        arg = (arg << 8) | u64::from(byte);
    }
    Ok((major, arg, 1 + needed))
}

/// Integer value for a text key in an attestation statement map
pub(crate) fn statement_int(stmt: &[(Value, Value)], key: &str) -> Option<i64> {
    match statement_value(stmt, key)? {
        Value::Integer(i) => i64::try_from(*i).ok(),
        _ => None,
    }
}

/// Byte-string value for a text key in an attestation statement map
pub(crate) fn statement_bytes<'a>(stmt: &'a [(Value, Value)], key: &str) -> Option<&'a [u8]> {
    match statement_value(stmt, key)? {
        Value::Bytes(b) => Some(b.as_slice()),
        _ => None,
    }
}

/// Certificate chain (array of byte strings) for a text key
pub(crate) fn statement_certs<'a>(
    stmt: &'a [(Value, Value)],
    key: &str,
) -> Option<Vec<&'a [u8]>> {
    match statement_value(stmt, key)? {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Bytes(b) => Some(b.as_slice()),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

/// Whether the statement map contains a text key at all
pub(crate) fn statement_has(stmt: &[(Value, Value)], key: &str) -> bool {
    statement_value(stmt, key).is_some()
}

fn statement_value<'a>(stmt: &'a [(Value, Value)], key: &str) -> Option<&'a Value> {
    stmt.iter().find_map(|(k, v)| match k {
        Value::Text(t) if t == key => Some(v),
        _ => None,
    })
}
