//! Report query compiler.
//!
//! Compiles the SQL-like report query language into a [`CompiledQuery`]:
//! the normalized query text plus one typed column per selected expression.
//!
//! ```text
//! SELECT <expr>[, <expr>...] FROM <resource>
//!
//! <expr> := <field.path>[~<int>|:<nested.path>][ AS <alias>]
//! ```
//!
//! # Example
//!
//! ```ignore
//! use gaarf::query::{compile, QueryParams};
//!
//! let query = compile(
//!     "SELECT campaign.id, campaign.name AS name, metrics.clicks FROM campaign",
//!     &QueryParams::new(),
//!     &schema,
//! )?;
//! for column in query.columns() {
//!     println!("{} {:?}", column.name, column.field_type);
//! }
//! ```

mod compiler;
mod error;
mod expr;
mod normalize;
mod text;
mod types;

pub use compiler::{compile, QueryCompiler};
pub use error::{CompileError, CompileResult, ErrorKind};
pub use expr::{parse_customizer, parse_select_item, SelectExpression};
pub use normalize::{normalize_query, QueryParams};
pub use text::strip_comments;
pub use types::{Column, CompiledQuery, Customizer, ResourceInfo};
