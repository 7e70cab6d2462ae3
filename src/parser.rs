//! Parse IDL source into AST using PEST.

use crate::ast::*;
use pest::error::{Error as PestError, ErrorVariant, InputLocation, LineColLocation};
use pest::iterators::Pair;
use pest::{Parser, Span};
use pest_derive::Parser as PestParser;
use std::collections::HashMap;

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct IdlParser;

/// Syntax error with the position of the first failure. Parsing stops there.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("syntax error at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    /// Byte offset into the source.
    pub offset: usize,
    pub message: String,
}

impl From<PestError<Rule>> for ParseError {
    fn from(e: PestError<Rule>) -> Self {
        let (line, column) = match e.line_col {
            LineColLocation::Pos(pos) => pos,
            LineColLocation::Span(start, _) => start,
        };
        let offset = match e.location {
            InputLocation::Pos(pos) => pos,
            InputLocation::Span((start, _)) => start,
        };
        ParseError {
            line,
            column,
            offset,
            message: e.variant.message().into_owned(),
        }
    }
}

fn error_at(span: Span<'_>, message: impl Into<String>) -> ParseError {
    PestError::new_from_span(
        ErrorVariant::<Rule>::CustomError {
            message: message.into(),
        },
        span,
    )
    .into()
}

/// Parse a schema: exactly one top-level `module`, optionally followed by `;`.
pub fn parse(source: &str) -> Result<Module, ParseError> {
    let pair = parse_entry(Rule::schema, source)?;
    build_module(child(pair, Rule::module_def)?)
}

/// Parse a single type reference, e.g. `unsigned long long` or `sequence<string>`.
pub fn parse_type_ref(source: &str) -> Result<TypeRef, ParseError> {
    let pair = parse_entry(Rule::type_ref_input, source)?;
    build_type_ref(child(pair, Rule::type_ref)?)
}

/// Parse zero or more whitespace-separated annotations.
pub fn parse_annotations(source: &str) -> Result<Vec<Annotation>, ParseError> {
    let pair = parse_entry(Rule::annotations_input, source)?;
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::annotation)
        .map(build_annotation)
        .collect()
}

/// Parse a standalone `struct` declaration.
pub fn parse_struct(source: &str) -> Result<Struct, ParseError> {
    let pair = parse_entry(Rule::struct_input, source)?;
    build_struct(child(pair, Rule::struct_def)?)
}

/// Parse a standalone `bitset` declaration.
pub fn parse_bitset(source: &str) -> Result<BitSet, ParseError> {
    let pair = parse_entry(Rule::bitset_input, source)?;
    build_bitset(child(pair, Rule::bitset_def)?)
}

fn parse_entry(rule: Rule, source: &str) -> Result<Pair<'_, Rule>, ParseError> {
    let mut pairs = IdlParser::parse(rule, source)?;
    pairs.next().ok_or_else(|| ParseError {
        line: 1,
        column: 1,
        offset: 0,
        message: "empty parse".to_string(),
    })
}

/// First direct child with the given rule.
fn child(pair: Pair<'_, Rule>, rule: Rule) -> Result<Pair<'_, Rule>, ParseError> {
    let span = pair.as_span();
    pair.into_inner()
        .find(|p| p.as_rule() == rule)
        .ok_or_else(|| error_at(span, format!("expected {:?}", rule)))
}

fn build_module(pair: Pair<Rule>) -> Result<Module, ParseError> {
    let span = pair.as_span();
    let mut name = None;
    let mut content = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = Some(inner.as_str().to_string()),
            Rule::bitset_def => content.push(ModuleContent::BitSet(build_bitset(inner)?)),
            Rule::struct_def => content.push(ModuleContent::Struct(build_struct(inner)?)),
            Rule::module_def => content.push(ModuleContent::Module(build_module(inner)?)),
            _ => {}
        }
    }
    Ok(Module {
        name: name.ok_or_else(|| error_at(span, "module: missing name"))?,
        content,
    })
}

fn build_bitset(pair: Pair<Rule>) -> Result<BitSet, ParseError> {
    let span = pair.as_span();
    let mut name = None;
    let mut fields = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = Some(inner.as_str().to_string()),
            Rule::bitset_field => fields.push(build_bitset_field(inner)?),
            _ => {}
        }
    }
    Ok(BitSet {
        name: name.ok_or_else(|| error_at(span, "bitset: missing name"))?,
        fields,
    })
}

fn build_bitset_field(pair: Pair<Rule>) -> Result<BitSetField, ParseError> {
    let span = pair.as_span();
    let mut name = None;
    let mut bitfield = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::bitfield_type => bitfield = Some(build_bitfield(inner)?),
            Rule::ident => name = Some(inner.as_str().to_string()),
            _ => {}
        }
    }
    Ok(BitSetField {
        name: name.ok_or_else(|| error_at(span, "bitset field: missing name"))?,
        bitfield: bitfield.ok_or_else(|| error_at(span, "bitset field: missing bitfield"))?,
    })
}

fn build_struct(pair: Pair<Rule>) -> Result<Struct, ParseError> {
    let span = pair.as_span();
    let mut name = None;
    let mut fields = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = Some(inner.as_str().to_string()),
            Rule::struct_field => fields.push(build_struct_field(inner)?),
            _ => {}
        }
    }
    Ok(Struct {
        name: name.ok_or_else(|| error_at(span, "struct: missing name"))?,
        fields,
    })
}

fn build_struct_field(pair: Pair<Rule>) -> Result<Field, ParseError> {
    let span = pair.as_span();
    let mut name = None;
    let mut type_ref = None;
    let mut annotations = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::annotation => annotations.push(build_annotation(inner)?),
            Rule::type_ref => type_ref = Some(build_type_ref(inner)?),
            Rule::ident => name = Some(inner.as_str().to_string()),
            _ => {}
        }
    }
    Ok(Field {
        name: name.ok_or_else(|| error_at(span, "field: missing name"))?,
        type_ref: type_ref.ok_or_else(|| error_at(span, "field: missing type"))?,
        annotations,
    })
}

fn build_type_ref(pair: Pair<Rule>) -> Result<TypeRef, ParseError> {
    let span = pair.as_span();
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| error_at(span, "empty type reference"))?;
    match inner.as_rule() {
        Rule::octet_type => Ok(TypeRef::Octet),
        Rule::short_type => Ok(TypeRef::Short),
        Rule::unsigned_short_type => Ok(TypeRef::UnsignedShort),
        Rule::long_type => Ok(TypeRef::Long),
        Rule::unsigned_long_type => Ok(TypeRef::UnsignedLong),
        Rule::long_long_type => Ok(TypeRef::LongLong),
        Rule::unsigned_long_long_type => Ok(TypeRef::UnsignedLongLong),
        Rule::boolean_type => Ok(TypeRef::Boolean),
        Rule::float_type => Ok(TypeRef::Float),
        Rule::string_type => Ok(TypeRef::String),
        Rule::bitfield_type => Ok(TypeRef::BitField(build_bitfield(inner)?)),
        Rule::sequence_type => {
            let elem = child(inner, Rule::type_ref)?;
            Ok(TypeRef::Sequence(Box::new(build_type_ref(elem)?)))
        }
        Rule::type_name => Ok(TypeRef::TypeName(
            child(inner, Rule::ident)?.as_str().to_string(),
        )),
        other => Err(error_at(span, format!("unhandled type rule: {:?}", other))),
    }
}

fn build_bitfield(pair: Pair<Rule>) -> Result<BitField, ParseError> {
    let width_pair = child(pair, Rule::bit_width)?;
    let span = width_pair.as_span();
    let width = width_pair
        .as_str()
        .parse::<u8>()
        .ok()
        .filter(|w| (1..=BitField::MAX_WIDTH).contains(w))
        .ok_or_else(|| {
            error_at(
                span,
                format!(
                    "bit-field width must be in 1..={}, got {}",
                    BitField::MAX_WIDTH,
                    width_pair.as_str()
                ),
            )
        })?;
    Ok(BitField { width })
}

fn build_annotation(pair: Pair<Rule>) -> Result<Annotation, ParseError> {
    let span = pair.as_span();
    let mut name = None;
    let mut values = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::annotation_name => name = Some(child(inner, Rule::ident)?.as_str().to_string()),
            Rule::annotation_args => {
                let mut map = HashMap::new();
                for kv in inner.into_inner() {
                    if kv.as_rule() == Rule::annotation_pair {
                        let (key, value) = build_annotation_pair(kv)?;
                        // Last write wins on duplicate keys.
                        map.insert(key, value);
                    }
                }
                values = Some(map);
            }
            _ => {}
        }
    }
    Ok(Annotation {
        name: name.ok_or_else(|| error_at(span, "annotation: missing name"))?,
        values,
    })
}

fn build_annotation_pair(pair: Pair<Rule>) -> Result<(String, String), ParseError> {
    let span = pair.as_span();
    let mut key = None;
    let mut value = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => key = Some(inner.as_str().to_string()),
            Rule::bare_value => value = Some(inner.as_str().to_string()),
            Rule::quoted_value => {
                value = Some(unescape_quoted(child(inner, Rule::quoted_text)?.as_str()))
            }
            _ => {}
        }
    }
    Ok((
        key.ok_or_else(|| error_at(span, "annotation value: missing key"))?,
        value.ok_or_else(|| error_at(span, "annotation value: missing value"))?,
    ))
}

fn unescape_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            _ => out.push(c),
        }
    }
    out
}
