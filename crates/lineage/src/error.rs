//! Error types for Lineage operations.
//!
//! - [`DocumentError`] is returned by every editing operation. It is always
//!   raised before anything is mutated, so a rejected operation leaves the
//!   document untouched.
//! - [`LoadError`] is returned when a file cannot be read as a genealogy
//!   document at all. Problems inside individual elements are not errors but
//!   [`Diagnostic`]s attached to the loaded document.
//! - [`LineageError`] wraps both together with I/O and configuration failures.

use std::io;

use thiserror::Error;

use lineage_core::identifier::Id;

use crate::{diagnostic::Diagnostic, model::ItemKind};

/// A rejected editing operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocumentError {
    /// The operation expects an entity of `kind`, and the id is either not in
    /// the document or belongs to an entity of another kind.
    #[error("no {kind} with id `{id}`")]
    NotFound { kind: ItemKind, id: Id },

    /// The id is not in the document and its kind cannot be told.
    #[error("no item with id `{0}`")]
    UnknownId(Id),

    /// The request is structurally disallowed in the current state.
    #[error("invalid operation: {0}")]
    InvalidState(String),
}

impl DocumentError {
    pub(crate) fn not_found(kind: ItemKind, id: Id) -> Self {
        Self::NotFound { kind, id }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }
}

/// A file that cannot be read as a genealogy document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("not a well-formed XML document: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("expected a `genealogy` root element, found `{0}`")]
    UnexpectedRoot(String),
}

/// The main error type for Lineage operations.
#[derive(Debug, Error)]
pub enum LineageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Load { err: LoadError, src: String },

    /// Elements were dropped while loading; carries every diagnostic with
    /// the source text they point into.
    #[error("{} element(s) could not be loaded", .diagnostics.iter().filter(|d| d.severity().is_error()).count())]
    Rejected {
        diagnostics: Vec<Diagnostic>,
        src: String,
    },

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LineageError {
    /// Create a new `Load` error with the associated source text.
    pub fn new_load_error(err: LoadError, src: impl Into<String>) -> Self {
        Self::Load {
            err,
            src: src.into(),
        }
    }
}
