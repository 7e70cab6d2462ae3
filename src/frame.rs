//! Frame handling: decode a buffer holding back-to-back instances of one struct.
//!
//! Decoding stops at the end of the buffer. The first record that fails aborts the
//! whole frame; nothing is skipped or repaired.

use crate::decoder::{DecodeError, Decoder};
use crate::value::Record;
use tracing::trace;

/// Records decoded from one frame, in buffer order.
#[derive(Debug, Default)]
pub struct FrameDecodeResult {
    pub records: Vec<DecodedRecord>,
}

#[derive(Debug)]
pub struct DecodedRecord {
    pub values: Record,
    /// Half-open byte range within the frame.
    pub byte_range: (usize, usize),
}

/// Decode records until `bytes` is exhausted.
///
/// A target struct with no fields consumes nothing; it yields no records rather than looping.
pub fn decode_frame(decoder: &Decoder<'_>, bytes: &[u8]) -> Result<FrameDecodeResult, DecodeError> {
    let mut records = Vec::new();
    let mut offset = 0;

    while offset < bytes.len() {
        let (values, rest) = decoder.decode(&bytes[offset..]).map_err(|e| DecodeError::Record {
            index: records.len(),
            offset,
            source: Box::new(e),
        })?;
        let consumed = bytes.len() - offset - rest.len();
        if consumed == 0 {
            break;
        }
        trace!(index = records.len(), offset, consumed, "decoded frame record");
        records.push(DecodedRecord {
            values,
            byte_range: (offset, offset + consumed),
        });
        offset += consumed;
    }

    Ok(FrameDecodeResult { records })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Field, Struct, TypeRef};
    use crate::value::Value;

    fn pair_struct() -> Struct {
        Struct {
            name: "P".to_string(),
            fields: vec![
                Field {
                    name: "id".to_string(),
                    type_ref: TypeRef::Octet,
                    annotations: Vec::new(),
                },
                Field {
                    name: "data".to_string(),
                    type_ref: TypeRef::Sequence(Box::new(TypeRef::Octet)),
                    annotations: Vec::new(),
                },
            ],
        }
    }

    #[test]
    fn decodes_consecutive_records() {
        let s = pair_struct();
        let decoder = Decoder::new(&s);
        let bytes = [1, 0, 0, 0, 1, 10, 2, 0, 0, 0, 0];
        let frame = decode_frame(&decoder, &bytes).unwrap();
        assert_eq!(frame.records.len(), 2);
        assert_eq!(frame.records[0].byte_range, (0, 6));
        assert_eq!(frame.records[1].byte_range, (6, 11));
        assert_eq!(frame.records[1].values.get("id"), Some(&Value::Int(2)));
        assert_eq!(frame.records[1].values.get("data"), Some(&Value::List(vec![])));
    }

    #[test]
    fn trailing_partial_record_fails() {
        let s = pair_struct();
        let decoder = Decoder::new(&s);
        let err = decode_frame(&decoder, &[1, 0, 0, 0, 0, 2, 0]).unwrap_err();
        match &err {
            DecodeError::Record { index, offset, .. } => {
                assert_eq!(*index, 1);
                assert_eq!(*offset, 5);
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(err.field(), Some("data"));
        assert!(err.is_truncated());
    }

    #[test]
    fn empty_buffer_yields_no_records() {
        let s = pair_struct();
        let frame = decode_frame(&Decoder::new(&s), &[]).unwrap();
        assert!(frame.records.is_empty());
    }

    #[test]
    fn fieldless_struct_does_not_loop() {
        let s = Struct {
            name: "E".to_string(),
            fields: Vec::new(),
        };
        let frame = decode_frame(&Decoder::new(&s), &[1, 2, 3]).unwrap();
        assert!(frame.records.is_empty());
    }
}
