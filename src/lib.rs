//! # gaarf
//!
//! Compiler front-end for report queries over a hierarchical resource schema.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Query text (+ template)                  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [template] (optional)
//! ┌─────────────────────────────────────────────────────────┐
//! │   Handlebars pass, comma-list params split to arrays     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [macros]
//! ┌─────────────────────────────────────────────────────────┐
//! │  Date literals, built-ins, {name} and ${expr} blocks     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [query] + [schema]
//! ┌─────────────────────────────────────────────────────────┐
//! │   CompiledQuery: fields, column names, customizers,      │
//! │   resource and resolved column types                     │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! [`compile`] sequences the stages; [`retry`] is a standalone backoff helper
//! for whatever executes the compiled query.

pub mod compile;
pub mod config;
pub mod macros;
pub mod query;
pub mod retry;
pub mod schema;
pub mod template;

pub use compile::{expand_query, prepare_query, PipelineError, PrepareOptions};
pub use query::{CompileError, CompiledQuery, ErrorKind};
pub use schema::Schema;
