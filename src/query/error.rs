//! Query compilation errors.

use thiserror::Error;

use crate::schema::{FieldTypeKind, SchemaError};

/// Result type for query compilation.
pub type CompileResult<T> = Result<T, CompileError>;

/// Broad category of a [`CompileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The query text itself is malformed.
    QuerySyntax,
    /// The query is well formed but references something the schema can't resolve.
    SchemaResolution,
}

/// Errors that can occur while compiling a query.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("empty select field at index {index}")]
    EmptySelectField { index: usize },

    #[error("expression '{expr}' contains indexed access ('~') but argument isn't a number")]
    InvalidResourceIndex { expr: String },

    #[error("expression '{expr}' contains nested path (':') but path is empty")]
    EmptyNestedPath { expr: String },

    #[error("duplicating column name {name} at index {index}")]
    DuplicateColumn { name: String, index: usize },

    #[error("could not find a SELECT ... FROM clause in the query")]
    MissingSelect,

    #[error("query doesn't select any fields")]
    NoFields,

    #[error("could not parse resource from the query")]
    MissingResource,

    #[error("the following parameters are used in the query but not specified: {}", .0.join(", "))]
    UnresolvedParams(Vec<String>),

    #[error("field {field} contains nested field accessor (:) but its type is {kind} ({type_name})")]
    NestedFieldOnScalar {
        field: String,
        kind: FieldTypeKind,
        type_name: String,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl CompileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NestedFieldOnScalar { .. } | Self::Schema(_) => ErrorKind::SchemaResolution,
            _ => ErrorKind::QuerySyntax,
        }
    }

    pub fn is_syntax_error(&self) -> bool {
        self.kind() == ErrorKind::QuerySyntax
    }
}
