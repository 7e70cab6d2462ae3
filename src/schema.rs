//! Schema resolution and verification over a parsed module tree.
//!
//! - **Resolver**: walks a caller-supplied dotted path (`a.b.Frame`) from the root
//!   module's content down to a target struct.
//! - **Verifier**: module purity (sub-modules never mixed with other content) and
//!   field support (every struct field has a kind the decoder handles).
//! - **Type-name binding**: a `TypeName` is looked up in its declaring module, then
//!   each enclosing module outwards.

use crate::ast::*;
use crate::decoder::{Decoder, DecoderOptions};
use crate::error::Error;
use crate::parser;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("empty path")]
    EmptyPath,
    #[error("path {path}: empty segment at position {position}")]
    EmptySegment { path: String, position: usize },
    #[error("path {path}: segment {segment} not found")]
    NotFound { path: String, segment: String },
    #[error("path {path}: segment {segment} is a {found}, expected a {expected}")]
    WrongKind {
        path: String,
        segment: String,
        expected: ContentKind,
        found: ContentKind,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("module {module} has both sub modules and other content")]
    MixedModule { module: String },
    #[error("struct {struct_name} field {field}: unknown type {type_name}")]
    UnknownTypeName {
        struct_name: String,
        field: String,
        type_name: String,
    },
    #[error("struct {struct_name} has unsupported field {field} of type {type_name}")]
    UnsupportedField {
        struct_name: String,
        field: String,
        type_name: String,
    },
}

/// What a `TypeName` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeBinding<'a> {
    Struct(&'a Struct),
    BitSet(&'a BitSet),
}

/// A parsed module tree that passed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    root: Module,
}

impl Schema {
    pub fn new(root: Module) -> Result<Self, VerifyError> {
        verify(&root)?;
        debug!(root = %root.name, entries = root.content.len(), "verified schema");
        Ok(Schema { root })
    }

    /// Parse and verify schema source.
    pub fn parse(source: &str) -> Result<Self, Error> {
        let root = parser::parse(source)?;
        Ok(Schema::new(root)?)
    }

    /// Read UTF-8 schema source from a file, then parse and verify it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), bytes = source.len(), "loaded schema source");
        Schema::parse(&source)
    }

    pub fn root(&self) -> &Module {
        &self.root
    }

    pub fn into_root(self) -> Module {
        self.root
    }

    /// Locate the struct at `path`, e.g. `bus.CANFrame`.
    pub fn resolve(&self, path: &str) -> Result<&Struct, ResolveError> {
        resolve(&self.root, path)
    }

    pub fn decoder(&self, path: &str) -> Result<Decoder<'_>, ResolveError> {
        self.decoder_with_options(path, DecoderOptions::default())
    }

    pub fn decoder_with_options(
        &self,
        path: &str,
        options: DecoderOptions,
    ) -> Result<Decoder<'_>, ResolveError> {
        Ok(Decoder::with_options(self.resolve(path)?, options))
    }

    /// Bind `name` as seen from the module at `module_path` (empty for the root module).
    pub fn bind_type_name(
        &self,
        module_path: &str,
        name: &str,
    ) -> Result<Option<TypeBinding<'_>>, ResolveError> {
        let scope = module_scope(&self.root, module_path)?;
        Ok(bind_type_name(&scope, name))
    }
}

/// Walk `path` from the content of `root`: every segment but the last must name a
/// module, the last must name a struct.
pub fn resolve<'a>(root: &'a Module, path: &str) -> Result<&'a Struct, ResolveError> {
    let segments = split_path(path)?;
    let (last, parents) = segments.split_last().ok_or(ResolveError::EmptyPath)?;
    let mut current = root;
    for segment in parents {
        current = descend(current, path, segment)?;
    }
    let found = find_kind(current, path, last, ContentKind::Struct)?;
    match found {
        ModuleContent::Struct(s) => {
            debug!(path, name = %s.name, fields = s.fields.len(), "resolved struct");
            Ok(s)
        }
        other => Err(wrong_kind(path, last, ContentKind::Struct, other.kind())),
    }
}

/// Run module purity then field support over the whole tree.
pub fn verify(root: &Module) -> Result<(), VerifyError> {
    verify_purity(root)?;
    let mut scope = Vec::new();
    verify_fields(root, &mut scope)
}

/// Bind `name` against the innermost module of `scope` first, then outwards.
/// `scope` runs from the root to the declaring module.
pub fn bind_type_name<'a>(scope: &[&'a Module], name: &str) -> Option<TypeBinding<'a>> {
    scope.iter().rev().find_map(|module| {
        module.content.iter().find_map(|c| match c {
            ModuleContent::Struct(s) if s.name == name => Some(TypeBinding::Struct(s)),
            ModuleContent::BitSet(b) if b.name == name => Some(TypeBinding::BitSet(b)),
            _ => None,
        })
    })
}

fn split_path(path: &str) -> Result<Vec<&str>, ResolveError> {
    let path = path.trim();
    if path.is_empty() {
        return Err(ResolveError::EmptyPath);
    }
    path.split('.')
        .enumerate()
        .map(|(position, segment)| {
            if segment.is_empty() {
                Err(ResolveError::EmptySegment {
                    path: path.to_string(),
                    position,
                })
            } else {
                Ok(segment)
            }
        })
        .collect()
}

fn descend<'a>(module: &'a Module, path: &str, segment: &str) -> Result<&'a Module, ResolveError> {
    match find_kind(module, path, segment, ContentKind::Module)? {
        ModuleContent::Module(m) => Ok(m),
        other => Err(wrong_kind(path, segment, ContentKind::Module, other.kind())),
    }
}

/// Entry named `segment`, preferring one of the `expected` kind.
fn find_kind<'a>(
    module: &'a Module,
    path: &str,
    segment: &str,
    expected: ContentKind,
) -> Result<&'a ModuleContent, ResolveError> {
    let mut named = module.content.iter().filter(|c| c.name() == segment);
    let first = named.clone().next().ok_or_else(|| ResolveError::NotFound {
        path: path.to_string(),
        segment: segment.to_string(),
    })?;
    Ok(named.find(|c| c.kind() == expected).unwrap_or(first))
}

fn wrong_kind(path: &str, segment: &str, expected: ContentKind, found: ContentKind) -> ResolveError {
    ResolveError::WrongKind {
        path: path.to_string(),
        segment: segment.to_string(),
        expected,
        found,
    }
}

/// Root-to-target chain of modules named by `module_path`.
fn module_scope<'a>(root: &'a Module, module_path: &str) -> Result<Vec<&'a Module>, ResolveError> {
    let mut scope = vec![root];
    if module_path.trim().is_empty() {
        return Ok(scope);
    }
    let mut current = root;
    for segment in split_path(module_path)? {
        current = descend(current, module_path, segment)?;
        scope.push(current);
    }
    Ok(scope)
}

fn verify_purity(module: &Module) -> Result<(), VerifyError> {
    let sub_modules = module.modules().count();
    if sub_modules > 0 && sub_modules < module.content.len() {
        return Err(VerifyError::MixedModule {
            module: module.name.clone(),
        });
    }
    for sub in module.modules() {
        verify_purity(sub)?;
    }
    Ok(())
}

fn verify_fields<'a>(module: &'a Module, scope: &mut Vec<&'a Module>) -> Result<(), VerifyError> {
    scope.push(module);
    for content in &module.content {
        match content {
            ModuleContent::Module(sub) => verify_fields(sub, scope)?,
            ModuleContent::Struct(s) => verify_struct(s, scope)?,
            ModuleContent::BitSet(_) => {}
        }
    }
    scope.pop();
    Ok(())
}

fn verify_struct(s: &Struct, scope: &[&Module]) -> Result<(), VerifyError> {
    for field in &s.fields {
        if let Some(name) = referenced_type_name(&field.type_ref) {
            if bind_type_name(scope, name).is_none() {
                return Err(VerifyError::UnknownTypeName {
                    struct_name: s.name.clone(),
                    field: field.name.clone(),
                    type_name: name.to_string(),
                });
            }
        }
        // Only the field's own kind is checked; sequence element kinds are left to the decoder.
        if !field.type_ref.kind().is_decodable() {
            return Err(VerifyError::UnsupportedField {
                struct_name: s.name.clone(),
                field: field.name.clone(),
                type_name: field.type_ref.type_name(),
            });
        }
    }
    Ok(())
}

fn referenced_type_name(type_ref: &TypeRef) -> Option<&str> {
    match type_ref {
        TypeRef::TypeName(name) => Some(name),
        TypeRef::Sequence(inner) => referenced_type_name(inner),
        _ => None,
    }
}
