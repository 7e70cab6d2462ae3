//! IDL grammar tests: syntax (parse success/failure) and AST shape.

use busidl::{
    parse, parse_bitset, parse_struct, parse_type_ref, BitField, ContentKind, ModuleContent,
    TypeKind, TypeRef,
};

// ==================== Syntax: valid programs ====================

#[test]
fn parse_empty_module() {
    let m = parse("module empty { }").expect("parse");
    assert_eq!(m.name, "empty");
    assert!(m.content.is_empty());
}

#[test]
fn parse_module_with_trailing_semicolon() {
    let m = parse("module m { struct A { octet a; }; };").expect("parse");
    assert_eq!(m.content.len(), 1);
}

#[test]
fn parse_bitset_and_struct_with_comments() {
    let src = r#"
module spi {
    bitset idbits {
        bitfield<4> bid; // 4 bits for bus_id
        bitfield<12> cid;  // 12 bits for can_id
    };

    /* frame carried on the bus */
    struct CANFrame {
        octet header;
        idbits id;
    };
}
"#;
    let m = parse(src).expect("parse");
    assert_eq!(m.name, "spi");
    assert_eq!(m.content.len(), 2);

    let ModuleContent::BitSet(first) = &m.content[0] else {
        panic!("expected bitset, got {:?}", m.content[0].kind());
    };
    assert_eq!(first.name, "idbits");
    assert_eq!(first.fields.len(), 2);
    assert_eq!(first.fields[0].name, "bid");
    assert_eq!(first.fields[0].bitfield, BitField { width: 4 });
    assert_eq!(first.fields[1].name, "cid");
    assert_eq!(first.fields[1].bitfield, BitField { width: 12 });
    assert_eq!(first.total_bits(), 16);

    let ModuleContent::Struct(second) = &m.content[1] else {
        panic!("expected struct, got {:?}", m.content[1].kind());
    };
    assert_eq!(second.name, "CANFrame");
    assert_eq!(second.fields[0].name, "header");
    assert_eq!(second.fields[0].type_ref.kind(), TypeKind::Octet);
    assert_eq!(second.fields[1].name, "id");
    assert_eq!(second.fields[1].type_ref.kind(), TypeKind::SelfDefined);
    assert_eq!(second.fields[1].type_ref.type_name(), "idbits");
}

#[test]
fn parse_full_bus_schema_preserves_declaration_order() {
    let src = r#"
module spi {
    bitset IdBits {
        bitfield<4> bid;
        bitfield<12> cid;
    };
    bitset LBits {
        bitfield<1> isUpdate;
        bitfield<7> plen;
    };
    struct CANFrame {
        octet header;
        IdBits id;
        LBits l;
        sequence<octet> payload;
    };
    struct SPI {
        unsigned short header;
        unsigned short plen;
        octet counter;
        octet crc;
        @format (type=canpack,dbc=ab) @merge sequence<CANFrame> messages;
    };
    struct parquet {
        unsigned long long timestamp;
        @format (type=binpack) @merge sequence<SPI> packs;
    };
}
"#;
    let m = parse(src).expect("parse");
    let names: Vec<(&str, ContentKind)> = m.content.iter().map(|c| (c.name(), c.kind())).collect();
    assert_eq!(
        names,
        vec![
            ("IdBits", ContentKind::BitSet),
            ("LBits", ContentKind::BitSet),
            ("CANFrame", ContentKind::Struct),
            ("SPI", ContentKind::Struct),
            ("parquet", ContentKind::Struct),
        ]
    );

    let spi = m.structs().find(|s| s.name == "SPI").expect("SPI");
    let kinds: Vec<TypeKind> = spi.fields.iter().map(|f| f.type_ref.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            TypeKind::UnsignedShort,
            TypeKind::UnsignedShort,
            TypeKind::Octet,
            TypeKind::Octet,
            TypeKind::Sequence,
        ]
    );
    let messages = spi.field("messages").expect("messages");
    assert_eq!(messages.annotations.len(), 2);
    assert_eq!(messages.annotations[0].name, "format");
    assert_eq!(messages.annotations[0].get("type"), Some("canpack"));
    assert_eq!(messages.annotations[0].get("dbc"), Some("ab"));
    assert_eq!(messages.annotations[1].name, "merge");
    assert!(messages.annotations[1].values.is_none());
    assert_eq!(
        messages.type_ref,
        TypeRef::Sequence(Box::new(TypeRef::TypeName("CANFrame".into())))
    );
}

#[test]
fn parse_nested_modules() {
    let src = "module a { module b { module c { struct S { long x; } } } module d { } }";
    let m = parse(src).expect("parse");
    let b = m.modules().next().expect("b");
    let c = b.modules().next().expect("c");
    assert_eq!(c.structs().next().expect("S").name, "S");
    assert_eq!(m.modules().count(), 2);
}

#[test]
fn parse_struct_all_primitive_types() {
    let src = r#"struct AllBase {
        octet a;
        short b;
        unsigned short c;
        long d;
        unsigned long e;
        long long f;
        unsigned long long g;
        boolean h;
        float i;
        string j;
        sequence<sequence<octet>> k;
    }"#;
    let s = parse_struct(src).expect("parse");
    let kinds: Vec<TypeKind> = s.fields.iter().map(|f| f.type_ref.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            TypeKind::Octet,
            TypeKind::Short,
            TypeKind::UnsignedShort,
            TypeKind::Long,
            TypeKind::UnsignedLong,
            TypeKind::LongLong,
            TypeKind::UnsignedLongLong,
            TypeKind::Boolean,
            TypeKind::Float,
            TypeKind::String,
            TypeKind::Sequence,
        ]
    );
}

#[test]
fn parse_struct_optional_trailing_semicolon() {
    assert_eq!(parse_struct("struct A { octet a; long b }").unwrap().fields.len(), 2);
    assert_eq!(parse_struct("struct A { octet a; long b; }").unwrap().fields.len(), 2);
    assert!(parse_struct("struct A { }").unwrap().fields.is_empty());
}

#[test]
fn parse_field_annotation_forms() {
    let s = parse_struct(
        r#"struct AB {
            @format(a=b) octet header;
            @format octet h1;
            @range(min = 1, max = "10") @unit(v=m/s) long h2;
            long h3;
        }"#,
    )
    .expect("parse");
    assert_eq!(s.fields[0].annotations[0].get("a"), Some("b"));
    assert!(s.fields[1].annotations[0].values.is_none());
    assert_eq!(s.fields[2].annotations.len(), 2);
    assert_eq!(s.fields[2].annotations[0].get("max"), Some("10"));
    assert_eq!(s.fields[2].annotation("unit").and_then(|a| a.get("v")), Some("m/s"));
    assert!(s.fields[3].annotations.is_empty());
}

#[test]
fn primitive_keywords_round_trip() {
    for kw in [
        "octet",
        "short",
        "unsigned short",
        "long",
        "unsigned long",
        "long long",
        "unsigned long long",
        "boolean",
        "float",
        "string",
        "bitfield<7>",
        "sequence<long long>",
        "sequence<sequence<string>>",
        "CANFrame",
    ] {
        let t = parse_type_ref(kw).expect(kw);
        assert_eq!(t.type_name(), kw);
        assert_eq!(parse_type_ref(&t.type_name()).expect(kw), t);
    }
}

#[test]
fn long_long_is_never_long_plus_dangling_token() {
    let s = parse_struct("struct A { long long x; unsigned long y; long z; }").expect("parse");
    assert_eq!(s.fields[0].type_ref, TypeRef::LongLong);
    assert_eq!(s.fields[0].name, "x");
    assert_eq!(s.fields[1].type_ref, TypeRef::UnsignedLong);
    assert_eq!(s.fields[2].type_ref, TypeRef::Long);
}

#[test]
fn parse_bitset_standalone() {
    let b = parse_bitset("bitset Flags { bitfield<1> a; bitfield<63> b; }").expect("parse");
    assert_eq!(b.total_bits(), 64);
}

// ==================== Syntax: invalid programs ====================

#[test]
fn reject_unterminated_struct() {
    assert!(parse("module m { struct A { octet a; ").is_err());
}

#[test]
fn reject_missing_field_name() {
    assert!(parse_struct("struct A { octet; }").is_err());
}

#[test]
fn reject_missing_separator() {
    assert!(parse_struct("struct A { octet a octet b }").is_err());
}

#[test]
fn reject_non_bitfield_in_bitset() {
    assert!(parse_bitset("bitset B { octet a; }").is_err());
}

#[test]
fn reject_bad_bitfield_width() {
    let err = parse_bitset("bitset B { bitfield<0> a; }").unwrap_err();
    assert!(err.message.contains("1..=64"));
    assert!(parse_bitset("bitset B { bitfield<65> a; }").is_err());
}

#[test]
fn reject_identifier_starting_with_digit() {
    assert!(parse("module 1m { }").is_err());
    assert!(parse_struct("struct A { octet 1a; }").is_err());
}

#[test]
fn reject_underscore_in_identifier() {
    assert!(parse_struct("struct A { octet bus_id; }").is_err());
}

#[test]
fn reject_malformed_annotation_in_field() {
    assert!(parse_struct("struct A { @format(a) octet x; }").is_err());
    assert!(parse_struct("struct A { @format(a=b octet x; }").is_err());
}

#[test]
fn reject_top_level_struct_without_module() {
    assert!(parse("struct A { octet a; }").is_err());
}

#[test]
fn error_position_points_into_source() {
    let src = "module m {\n  struct A {\n    octet a;\n    sequence<octet b;\n  }\n}";
    let err = parse(src).unwrap_err();
    assert_eq!(err.line, 4);
    assert!(err.offset > 0 && err.offset < src.len());
}
