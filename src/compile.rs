//! End-to-end preparation of a query file.
//!
//! Sequences the independent stages in the order the reporting tools run them:
//!
//! ```text
//! Query text → [template] → Macro substitution → Compile against schema → CompiledQuery
//! ```
//!
//! # Example
//!
//! ```ignore
//! use gaarf::compile::{prepare_query, PrepareOptions};
//! use gaarf::macros::{MacroMap, SystemClock};
//! use gaarf::schema::Schema;
//!
//! let schema = Schema::from_file("schema.json")?;
//! let mut macros = MacroMap::new();
//! macros.insert("start".into(), ":YYYYMMDD-7".into());
//!
//! let query = "SELECT campaign.id FROM campaign WHERE segments.date >= '{start}'";
//! let output = prepare_query(query, &mut macros, &schema, PrepareOptions::new(&SystemClock))?;
//! for column in output.query.columns() {
//!     println!("{} {}", column.name, column.field_type.type_name);
//! }
//! ```

use tracing::{debug, warn};

use crate::macros::{self, Clock, MacroError, MacroMap};
use crate::query::{self, CompileError, CompiledQuery, ErrorKind, QueryParams};
use crate::schema::Schema;
use crate::template::{self, TemplateError, TemplateParams};

// ============================================================================
// Error Types
// ============================================================================

/// Errors from any stage of query preparation.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Macro error: {0}")]
    Macro(#[from] MacroError),

    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),
}

impl PipelineError {
    /// Compile-stage classification, if the failure came from the compiler.
    pub fn compile_kind(&self) -> Option<ErrorKind> {
        match self {
            PipelineError::Compile(e) => Some(e.kind()),
            _ => None,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

// ============================================================================
// Options
// ============================================================================

/// Options for [`prepare_query`] and [`expand_query`].
#[derive(Clone, Copy)]
pub struct PrepareOptions<'a> {
    /// Source of "today" for date macros.
    pub clock: &'a dyn Clock,
    /// When set, the query text is rendered as a template first.
    pub template_params: Option<&'a TemplateParams>,
}

impl<'a> PrepareOptions<'a> {
    pub fn new(clock: &'a dyn Clock) -> Self {
        Self {
            clock,
            template_params: None,
        }
    }

    /// Render the query as a template with these parameters.
    pub fn with_template(mut self, params: &'a TemplateParams) -> Self {
        self.template_params = Some(params);
        self
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Query text after templating and macro substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedQuery {
    pub text: String,
    /// `{name}` placeholders no macro matched, left verbatim in `text`.
    pub unresolved_macros: Vec<String>,
}

/// Result of preparing a query for execution.
#[derive(Debug, Clone)]
pub struct PrepareOutput {
    /// The compiled query.
    pub query: CompiledQuery,

    /// Query text as it was handed to the compiler.
    pub expanded_text: String,
}

// ============================================================================
// Pipeline Functions
// ============================================================================

/// Render (optionally) and macro-substitute a query without compiling it.
///
/// Unknown `{name}` placeholders are not an error at this stage; they are
/// reported in [`ExpandedQuery::unresolved_macros`].
pub fn expand_query(
    text: &str,
    macros: &mut MacroMap,
    options: PrepareOptions<'_>,
) -> PipelineResult<ExpandedQuery> {
    let rendered;
    let text = match options.template_params {
        Some(params) => {
            rendered = template::render(text, params)?;
            rendered.as_str()
        }
        None => text,
    };

    let substitution = macros::substitute(text, macros, options.clock)?;
    Ok(ExpandedQuery {
        text: substitution.text,
        unresolved_macros: substitution.unresolved,
    })
}

/// Expand and compile a query.
///
/// The macro map doubles as the compiler's strict parameter set, so a
/// placeholder left unresolved by macro substitution fails compilation with
/// [`CompileError::UnresolvedParams`].
pub fn prepare_query(
    text: &str,
    macros: &mut MacroMap,
    schema: &Schema,
    options: PrepareOptions<'_>,
) -> PipelineResult<PrepareOutput> {
    let expanded = expand_query(text, macros, options)?;
    if !expanded.unresolved_macros.is_empty() {
        warn!(
            unresolved = ?expanded.unresolved_macros,
            "query references macros that were not provided"
        );
    }

    let params = macro_params(macros);
    let query = query::compile(&expanded.text, &params, schema)?;
    debug!(columns = query.len(), "prepared query");

    Ok(PrepareOutput {
        query,
        expanded_text: expanded.text,
    })
}

/// Stringify macro values for the compiler's placeholder pass.
pub fn macro_params(macros: &MacroMap) -> QueryParams {
    macros
        .iter()
        .map(|(name, value)| (name.clone(), value.to_string()))
        .collect()
}
