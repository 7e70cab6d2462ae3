//! # busidl — IDL for fixed-format binary records
//!
//! A schema language for byte-oriented protocols (e.g. bus frames) with a PEST
//! grammar, plus a decoder that turns raw bytes into structured values according to
//! a parsed schema.
//!
//! ## IDL structure
//!
//! - **module**: named namespace holding bitsets and structs, or only nested modules
//! - **bitset**: named group of `bitfield<N>` fields
//! - **struct**: named, ordered group of typed fields, each optionally annotated
//!
//! ## Field types
//!
//! - `octet`, `short`, `unsigned short`, `long`, `unsigned long`, `long long`,
//!   `unsigned long long`, `boolean`, `float`, `string`
//! - `sequence<T>` (4-byte length prefix, then the elements)
//! - `bitfield<N>` with `1 <= N <= 64`
//! - a struct or bitset name
//!
//! Annotations are `@name` or `@name(key=value, key2="value 2")` and are kept as
//! uninterpreted string metadata.
//!
//! ## Example IDL
//!
//! ```text
//! module spi {
//!     bitset IdBits {
//!         bitfield<4> bid;   // bus id
//!         bitfield<12> cid;  // can id
//!     };
//!
//!     struct Frame {
//!         unsigned short header;
//!         @format(type=canpack) sequence<octet> payload;
//!     };
//! }
//! ```
//!
//! ## Usage
//!
//! ```
//! use busidl::{Schema, Value};
//!
//! let schema = Schema::parse("module m { struct P { octet id1; octet id2; }; }").unwrap();
//! let decoder = schema.decoder("P").unwrap();
//! let (record, rest) = decoder.decode(&[41, 42]).unwrap();
//! assert_eq!(record.get("id1"), Some(&Value::Int(41)));
//! assert!(rest.is_empty());
//! ```

pub mod ast;
pub mod decoder;
pub mod dump;
pub mod error;
pub mod frame;
pub mod parser;
pub mod schema;
pub mod value;

pub use ast::{
    Annotation, BitField, BitSet, BitSetField, ContentKind, Field, Module, ModuleContent, Struct,
    TypeKind, TypeRef,
};
pub use decoder::{decode_type, DecodeError, Decoder, DecoderOptions, Endianness};
pub use error::Error;
pub use frame::{decode_frame, FrameDecodeResult};
pub use parser::{parse, parse_annotations, parse_bitset, parse_struct, parse_type_ref, ParseError};
pub use schema::{resolve, verify, ResolveError, Schema, TypeBinding, VerifyError};
pub use value::{Record, Value};
