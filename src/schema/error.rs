//! Schema-specific error types.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while loading a schema or resolving references against it.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The top-level resource is not declared in the row descriptor.
    #[error("could not find resource '{0}' in schema")]
    UnknownResource(String),

    /// The resource is declared but its type does not exist.
    #[error("could not find type '{type_ref}' of resource '{resource}'")]
    UnknownResourceType { resource: String, type_ref: String },

    /// A path segment names a field the current type doesn't have.
    #[error("type '{type_name}' has no field '{field}' (path '{path}')")]
    UnknownField {
        type_name: String,
        field: String,
        path: String,
    },

    /// A field references a type that none of the namespaces define.
    #[error("could not find a type for '{type_ref}' (referenced from '{scope}')")]
    UnknownType { type_ref: String, scope: String },

    /// A fully qualified enum reference names a missing enum.
    #[error("could not find enum '{0}'")]
    UnknownEnum(String),

    /// A fully qualified reference doesn't have the expected shape.
    #[error("could not parse type reference '{0}'")]
    InvalidReference(String),

    /// A repeated field is followed by further segments.
    #[error("repeated field '{field}' in the middle of path '{path}'")]
    RepeatedInMiddle { field: String, path: String },

    /// A primitive-typed field is followed by further segments.
    #[error("field '{field}' in path '{path}' has primitive type {type_name}")]
    NonTerminalPrimitive {
        field: String,
        path: String,
        type_name: String,
    },

    /// An enum-typed field is followed by further segments.
    #[error("field '{field}' in path '{path}' has enum type {type_name}")]
    NonTerminalEnum {
        field: String,
        path: String,
        type_name: String,
    },

    /// A field path stops at the resource itself.
    #[error("field path for '{0}' must name at least one field")]
    EmptyPath(String),

    /// Failed to read a schema file.
    #[error("failed to read schema file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to parse a schema descriptor.
    #[error("failed to parse schema: {0}")]
    Parse(#[from] serde_json::Error),
}
