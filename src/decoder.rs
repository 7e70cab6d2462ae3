//! Decode binary records according to a resolved struct.
//!
//! Fields are consumed left to right in declaration order. Multi-byte integers and
//! floats are big-endian by default; `string` and `sequence<T>` carry a 4-byte
//! unsigned length prefix. Any short read aborts the whole record.

use crate::ast::{Struct, TypeRef};
use crate::value::{Record, Value};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::io::Cursor;
use tracing::{debug, trace};

/// Size of the `string` / `sequence` length prefix.
pub const LENGTH_PREFIX: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Endianness {
    #[default]
    Big,
    Little,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderOptions {
    pub endianness: Endianness,
    /// Upper bound on a sequence length prefix; `None` accepts any `u32`.
    pub max_sequence_len: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("truncated: expected {expected} bytes, {available} available")]
    Truncated { expected: usize, available: usize },
    #[error("unsupported type: {0}")]
    UnsupportedType(String),
    #[error("invalid UTF-8 in string: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("sequence length {len} exceeds limit {limit}")]
    SequenceTooLong { len: u32, limit: u32 },
    #[error("element {index}: {source}")]
    Element {
        index: usize,
        #[source]
        source: Box<DecodeError>,
    },
    #[error("struct {struct_name} field {field}: {source}")]
    Field {
        struct_name: String,
        field: String,
        #[source]
        source: Box<DecodeError>,
    },
    #[error("record {index} at offset {offset}: {source}")]
    Record {
        index: usize,
        offset: usize,
        #[source]
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Terminal cause, with field/element/record context stripped.
    pub fn innermost(&self) -> &DecodeError {
        match self {
            DecodeError::Element { source, .. }
            | DecodeError::Field { source, .. }
            | DecodeError::Record { source, .. } => source.innermost(),
            other => other,
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self.innermost(), DecodeError::Truncated { .. })
    }

    /// Name of the outermost field that failed, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            DecodeError::Field { field, .. } => Some(field),
            DecodeError::Record { source, .. } => source.field(),
            _ => None,
        }
    }
}

/// Decoder bound to one target struct. Holds no mutable state; share freely across threads.
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'s> {
    target: &'s Struct,
    options: DecoderOptions,
}

impl<'s> Decoder<'s> {
    pub fn new(target: &'s Struct) -> Self {
        Decoder::with_options(target, DecoderOptions::default())
    }

    pub fn with_options(target: &'s Struct, options: DecoderOptions) -> Self {
        Decoder { target, options }
    }

    pub fn target(&self) -> &'s Struct {
        self.target
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Decode one instance of the target struct. Returns the record and the unconsumed remainder.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Result<(Record, &'a [u8]), DecodeError> {
        let mut cursor = Cursor::new(bytes);
        let record = self.decode_record(&mut cursor)?;
        let consumed = cursor.position() as usize;
        debug!(
            name = %self.target.name,
            consumed,
            remaining = bytes.len() - consumed,
            "decoded record"
        );
        Ok((record, &bytes[consumed..]))
    }

    fn decode_record(&self, r: &mut Cursor<&[u8]>) -> Result<Record, DecodeError> {
        let mut record = Record::with_capacity(self.target.fields.len());
        for field in &self.target.fields {
            let start = r.position();
            let value = self
                .options
                .read_type(r, &field.type_ref)
                .map_err(|e| DecodeError::Field {
                    struct_name: self.target.name.clone(),
                    field: field.name.clone(),
                    source: Box::new(e),
                })?;
            trace!(field = %field.name, consumed = r.position() - start, "decoded field");
            record.insert(field.name.clone(), value);
        }
        Ok(record)
    }
}

/// Decode a single value of the given type. Returns the value and the unconsumed remainder.
pub fn decode_type<'a>(
    type_ref: &TypeRef,
    bytes: &'a [u8],
    options: &DecoderOptions,
) -> Result<(Value, &'a [u8]), DecodeError> {
    let mut cursor = Cursor::new(bytes);
    let value = options.read_type(&mut cursor, type_ref)?;
    Ok((value, &bytes[cursor.position() as usize..]))
}

fn remaining(r: &Cursor<&[u8]>) -> usize {
    r.get_ref().len().saturating_sub(r.position() as usize)
}

fn take<'a>(r: &mut Cursor<&'a [u8]>, n: usize) -> Result<&'a [u8], DecodeError> {
    let buf: &'a [u8] = *r.get_ref();
    let pos = (r.position() as usize).min(buf.len());
    let available = buf.len() - pos;
    if available < n {
        return Err(DecodeError::Truncated {
            expected: n,
            available,
        });
    }
    r.set_position((pos + n) as u64);
    Ok(&buf[pos..pos + n])
}

impl DecoderOptions {
    fn read_type(&self, r: &mut Cursor<&[u8]>, type_ref: &TypeRef) -> Result<Value, DecodeError> {
        match type_ref {
            TypeRef::Octet => Ok(Value::Int(i64::from(take(r, 1)?[0]))),
            TypeRef::Short => Ok(Value::Int(i64::from(self.read_i16(r)?))),
            TypeRef::UnsignedShort => Ok(Value::Int(i64::from(self.read_u16(r)?))),
            TypeRef::Long => Ok(Value::Int(i64::from(self.read_i32(r)?))),
            TypeRef::UnsignedLong => Ok(Value::Int(i64::from(self.read_u32(r)?))),
            TypeRef::LongLong => Ok(Value::Int(self.read_i64(r)?)),
            // Values above i64::MAX wrap.
            TypeRef::UnsignedLongLong => Ok(Value::Int(self.read_u64(r)? as i64)),
            TypeRef::Boolean => Ok(Value::Bool(take(r, 1)?[0] != 0x00)),
            TypeRef::Float => Ok(Value::Float(f64::from(self.read_f32(r)?))),
            TypeRef::String => self.read_string(r),
            TypeRef::Sequence(inner) => self.read_sequence(r, inner),
            TypeRef::BitField(_) | TypeRef::TypeName(_) => {
                Err(DecodeError::UnsupportedType(type_ref.type_name()))
            }
        }
    }

    fn read_string(&self, r: &mut Cursor<&[u8]>) -> Result<Value, DecodeError> {
        // A string needs its prefix plus at least one more byte before anything is read.
        let available = remaining(r);
        if available <= LENGTH_PREFIX {
            return Err(DecodeError::Truncated {
                expected: LENGTH_PREFIX + 1,
                available,
            });
        }
        let len = self.read_u32(r)? as usize;
        let body = take(r, len)?;
        Ok(Value::String(std::str::from_utf8(body)?.to_string()))
    }

    fn read_sequence(&self, r: &mut Cursor<&[u8]>, inner: &TypeRef) -> Result<Value, DecodeError> {
        let len = self.read_u32(r)?;
        if let Some(limit) = self.max_sequence_len {
            if len > limit {
                return Err(DecodeError::SequenceTooLong { len, limit });
            }
        }
        // Every decodable element takes at least one byte.
        let mut items = Vec::with_capacity((len as usize).min(remaining(r)));
        for index in 0..len as usize {
            let item = self.read_type(r, inner).map_err(|e| DecodeError::Element {
                index,
                source: Box::new(e),
            })?;
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn read_u16(&self, r: &mut Cursor<&[u8]>) -> Result<u16, DecodeError> {
        let b = take(r, 2)?;
        Ok(match self.endianness {
            Endianness::Big => BigEndian::read_u16(b),
            Endianness::Little => LittleEndian::read_u16(b),
        })
    }
    fn read_i16(&self, r: &mut Cursor<&[u8]>) -> Result<i16, DecodeError> {
        let b = take(r, 2)?;
        Ok(match self.endianness {
            Endianness::Big => BigEndian::read_i16(b),
            Endianness::Little => LittleEndian::read_i16(b),
        })
    }
    fn read_u32(&self, r: &mut Cursor<&[u8]>) -> Result<u32, DecodeError> {
        let b = take(r, 4)?;
        Ok(match self.endianness {
            Endianness::Big => BigEndian::read_u32(b),
            Endianness::Little => LittleEndian::read_u32(b),
        })
    }
    fn read_i32(&self, r: &mut Cursor<&[u8]>) -> Result<i32, DecodeError> {
        let b = take(r, 4)?;
        Ok(match self.endianness {
            Endianness::Big => BigEndian::read_i32(b),
            Endianness::Little => LittleEndian::read_i32(b),
        })
    }
    fn read_u64(&self, r: &mut Cursor<&[u8]>) -> Result<u64, DecodeError> {
        let b = take(r, 8)?;
        Ok(match self.endianness {
            Endianness::Big => BigEndian::read_u64(b),
            Endianness::Little => LittleEndian::read_u64(b),
        })
    }
    fn read_i64(&self, r: &mut Cursor<&[u8]>) -> Result<i64, DecodeError> {
        let b = take(r, 8)?;
        Ok(match self.endianness {
            Endianness::Big => BigEndian::read_i64(b),
            Endianness::Little => LittleEndian::read_i64(b),
        })
    }
    fn read_f32(&self, r: &mut Cursor<&[u8]>) -> Result<f32, DecodeError> {
        let b = take(r, 4)?;
        Ok(match self.endianness {
            Endianness::Big => BigEndian::read_f32(b),
            Endianness::Little => LittleEndian::read_f32(b),
        })
    }
}
