//! Abstract Syntax Tree for the IDL.
//!
//! Built once by [`crate::parser`], immutable afterwards. Type names are kept
//! unresolved here; binding them to a struct or bitset is done by [`crate::schema`].

use std::collections::HashMap;
use std::fmt;

/// Field type reference. Closed set; every consumer matches exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Octet,
    Short,
    UnsignedShort,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Boolean,
    Float,
    String,
    BitField(BitField),
    Sequence(Box<TypeRef>),
    /// Reference to a struct or bitset by name; unresolved.
    TypeName(String),
}

/// Kind tag of a [`TypeRef`], without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Octet,
    Short,
    UnsignedShort,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Boolean,
    Float,
    String,
    BitField,
    Sequence,
    SelfDefined,
}

impl TypeKind {
    /// Kinds the decoder has a rule for.
    pub fn is_decodable(self) -> bool {
        match self {
            TypeKind::Octet
            | TypeKind::Short
            | TypeKind::UnsignedShort
            | TypeKind::Long
            | TypeKind::UnsignedLong
            | TypeKind::LongLong
            | TypeKind::UnsignedLongLong
            | TypeKind::Boolean
            | TypeKind::Float
            | TypeKind::String
            | TypeKind::Sequence => true,
            TypeKind::BitField | TypeKind::SelfDefined => false,
        }
    }
}

impl TypeRef {
    pub fn kind(&self) -> TypeKind {
        match self {
            TypeRef::Octet => TypeKind::Octet,
            TypeRef::Short => TypeKind::Short,
            TypeRef::UnsignedShort => TypeKind::UnsignedShort,
            TypeRef::Long => TypeKind::Long,
            TypeRef::UnsignedLong => TypeKind::UnsignedLong,
            TypeRef::LongLong => TypeKind::LongLong,
            TypeRef::UnsignedLongLong => TypeKind::UnsignedLongLong,
            TypeRef::Boolean => TypeKind::Boolean,
            TypeRef::Float => TypeKind::Float,
            TypeRef::String => TypeKind::String,
            TypeRef::BitField(_) => TypeKind::BitField,
            TypeRef::Sequence(_) => TypeKind::Sequence,
            TypeRef::TypeName(_) => TypeKind::SelfDefined,
        }
    }

    /// Canonical source spelling, e.g. `unsigned long long`, `sequence<octet>`, `bitfield<4>`.
    pub fn type_name(&self) -> String {
        self.to_string()
    }

    /// Fixed encoded size in bytes, or `None` for length-prefixed and undecodable kinds.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            TypeRef::Octet | TypeRef::Boolean => Some(1),
            TypeRef::Short | TypeRef::UnsignedShort => Some(2),
            TypeRef::Long | TypeRef::UnsignedLong | TypeRef::Float => Some(4),
            TypeRef::LongLong | TypeRef::UnsignedLongLong => Some(8),
            TypeRef::String
            | TypeRef::BitField(_)
            | TypeRef::Sequence(_)
            | TypeRef::TypeName(_) => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Octet => f.write_str("octet"),
            TypeRef::Short => f.write_str("short"),
            TypeRef::UnsignedShort => f.write_str("unsigned short"),
            TypeRef::Long => f.write_str("long"),
            TypeRef::UnsignedLong => f.write_str("unsigned long"),
            TypeRef::LongLong => f.write_str("long long"),
            TypeRef::UnsignedLongLong => f.write_str("unsigned long long"),
            TypeRef::Boolean => f.write_str("boolean"),
            TypeRef::Float => f.write_str("float"),
            TypeRef::String => f.write_str("string"),
            TypeRef::BitField(bf) => write!(f, "bitfield<{}>", bf.width),
            TypeRef::Sequence(inner) => write!(f, "sequence<{}>", inner),
            TypeRef::TypeName(name) => f.write_str(name),
        }
    }
}

/// `bitfield<N>`: N bits, 1..=64.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    pub width: u8,
}

impl BitField {
    pub const MAX_WIDTH: u8 = 64;
}

/// `@name` or `@name(key=value, ...)`. Values are opaque strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub name: String,
    /// `None` for a bare annotation.
    pub values: Option<HashMap<String, String>>,
}

impl Annotation {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.as_ref()?.get(key).map(String::as_str)
    }
}

/// Struct field: annotations, type, name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub type_ref: TypeRef,
    pub annotations: Vec<Annotation>,
}

impl Field {
    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.name == name)
    }
}

/// Bitset field: always a bit-field, no annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitSetField {
    pub name: String,
    pub bitfield: BitField,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitSet {
    pub name: String,
    pub fields: Vec<BitSetField>,
}

impl BitSet {
    /// Sum of declared field widths.
    pub fn total_bits(&self) -> u32 {
        self.fields.iter().map(|f| u32::from(f.bitfield.width)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Struct {
    pub name: String,
    pub fields: Vec<Field>,
}

impl Struct {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Named container of bitsets, structs and nested modules, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    pub content: Vec<ModuleContent>,
}

impl Module {
    /// First content entry with the given name.
    pub fn get(&self, name: &str) -> Option<&ModuleContent> {
        self.content.iter().find(|c| c.name() == name)
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.content.iter().filter_map(|c| match c {
            ModuleContent::Module(m) => Some(m),
            _ => None,
        })
    }

    pub fn structs(&self) -> impl Iterator<Item = &Struct> {
        self.content.iter().filter_map(|c| match c {
            ModuleContent::Struct(s) => Some(s),
            _ => None,
        })
    }

    pub fn bitsets(&self) -> impl Iterator<Item = &BitSet> {
        self.content.iter().filter_map(|c| match c {
            ModuleContent::BitSet(b) => Some(b),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleContent {
    BitSet(BitSet),
    Struct(Struct),
    Module(Module),
}

impl ModuleContent {
    pub fn name(&self) -> &str {
        match self {
            ModuleContent::BitSet(b) => &b.name,
            ModuleContent::Struct(s) => &s.name,
            ModuleContent::Module(m) => &m.name,
        }
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            ModuleContent::BitSet(_) => ContentKind::BitSet,
            ModuleContent::Struct(_) => ContentKind::Struct,
            ModuleContent::Module(_) => ContentKind::Module,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    BitSet,
    Struct,
    Module,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::BitSet => f.write_str("bitset"),
            ContentKind::Struct => f.write_str("struct"),
            ContentKind::Module => f.write_str("module"),
        }
    }
}
