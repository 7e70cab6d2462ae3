//! Crate-level error covering every stage from schema text to decoded record.

use crate::decoder::DecodeError;
use crate::parser::ParseError;
use crate::schema::{ResolveError, VerifyError};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Verify(#[from] VerifyError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
