//! Confluent-framed Avro record decoder.
//!
//! Payloads arrive as a 5-byte wire header (magic byte `0x00` plus the
//! big-endian registry schema id) followed by the Avro binary body. The body
//! is decoded against the cached schema into a typed intermediate record and
//! the three required string fields become a [`Triple`] stamped with the
//! current time.
//!
//! Decoding never retries: a malformed payload is reported once and the
//! caller moves on to the next message.

use std::io::Cursor;

use apache_avro::from_avro_datum;
use apache_avro::types::Value;
use lattice_core::{DecodeError, Triple};

use crate::cache::SchemaHandle;

/// Confluent wire-format magic byte.
pub const WIRE_MAGIC: u8 = 0;

/// Length of the wire header: magic byte plus 4-byte schema id.
pub const WIRE_HEADER_LEN: usize = 5;

/// Typed intermediate form of a decoded record: the three required string
/// fields, each still optional so that absence surfaces as
/// [`DecodeError::MissingField`] rather than a generic decode failure.
/// Extra fields in the record are ignored.
#[derive(Debug, Default)]
struct RawRecord {
    subject: Option<String>,
    predicate: Option<String>,
    object: Option<String>,
}

impl TryFrom<Value> for RawRecord {
    type Error = DecodeError;

    fn try_from(datum: Value) -> Result<Self, Self::Error> {
        let Value::Record(fields) = datum else {
            return Err(DecodeError::Malformed {
                reason: "decoded datum is not a record".to_string(),
            });
        };

        let mut raw = RawRecord::default();
        for (name, value) in fields {
            let slot = match name.as_str() {
                "subject" => &mut raw.subject,
                "predicate" => &mut raw.predicate,
                "object" => &mut raw.object,
                _ => continue,
            };
            // Nullable fields decode as Union(_, inner); a null value is
            // the same as an absent field.
            *slot = match value {
                Value::Null => None,
                Value::Union(_, inner) => match *inner {
                    Value::Null => None,
                    inner => Some(into_string(&name, inner)?),
                },
                value => Some(into_string(&name, value)?),
            };
        }
        Ok(raw)
    }
}

fn into_string(name: &str, value: Value) -> Result<String, DecodeError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(DecodeError::Malformed {
            reason: format!("field '{}' is not a string: {:?}", name, other),
        }),
    }
}

/// Decode a framed Avro payload into a [`Triple`].
pub fn decode(handle: &SchemaHandle, payload: &[u8]) -> Result<Triple, DecodeError> {
    let body = strip_frame(handle, payload)?;

    let datum = from_avro_datum(&handle.schema, &mut Cursor::new(body), None).map_err(|e| {
        DecodeError::Malformed {
            reason: format!("Avro decode failed: {}", e),
        }
    })?;

    let record = RawRecord::try_from(datum)?;

    let subject = record
        .subject
        .ok_or(DecodeError::MissingField { field: "subject" })?;
    let predicate = record
        .predicate
        .ok_or(DecodeError::MissingField { field: "predicate" })?;
    let object = record
        .object
        .ok_or(DecodeError::MissingField { field: "object" })?;

    Ok(Triple::new(subject, predicate, object))
}

/// Validate the wire header and return the Avro body.
fn strip_frame<'a>(handle: &SchemaHandle, payload: &'a [u8]) -> Result<&'a [u8], DecodeError> {
    if payload.len() < WIRE_HEADER_LEN {
        return Err(DecodeError::Malformed {
            reason: format!("payload too short for wire header: {} bytes", payload.len()),
        });
    }
    if payload[0] != WIRE_MAGIC {
        return Err(DecodeError::Malformed {
            reason: format!("unexpected magic byte 0x{:02x}", payload[0]),
        });
    }

    let wire_id = i32::from_be_bytes([payload[1], payload[2], payload[3], payload[4]]);
    if wire_id != handle.registry_id {
        // Informational only: we decode with the schema resolved by name,
        // never by the writer id embedded in the frame.
        tracing::debug!(
            wire_id,
            cached_id = handle.registry_id,
            logical_name = %handle.logical_name,
            "Payload schema id differs from cached schema id"
        );
    }

    Ok(&payload[WIRE_HEADER_LEN..])
}
