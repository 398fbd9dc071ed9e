//! Schema model consulted by the query compiler.
//!
//! The schema is supplied externally (usually as a JSON descriptor generated
//! from the reporting API's type definitions) and is never mutated once built.

mod error;
mod model;
mod resolve;

pub use error::{SchemaError, SchemaResult};
pub use model::{EnumDef, FieldDef, PrimitiveType, Schema, SchemaBuilder, StructDef};
pub use resolve::{FieldType, FieldTypeKind, ResolvedField, TypeRef};
