//! Select expression parsing.
//!
//! Grammar of one select item:
//!
//! ```text
//! <field.path>[~<int>|:<nested.path>][ AS <alias>]
//! ```
//!
//! The `~` check runs before the `:` check, so an expression never carries
//! both customizers: `a.b~1:c` is a resource index whose argument is `1:c`
//! (and therefore rejected).

use super::error::{CompileError, CompileResult};
use super::types::Customizer;

/// One parsed item of the select list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectExpression {
    pub field: String,
    pub alias: Option<String>,
    pub customizer: Option<Customizer>,
}

impl SelectExpression {
    /// Output column name: the alias, or the field path without spaces.
    pub fn column_name(&self) -> String {
        let name = self.alias.as_deref().unwrap_or(&self.field);
        name.chars().filter(|c| *c != ' ').collect()
    }
}

/// Parse the select item at `index`.
pub fn parse_select_item(item: &str, index: usize) -> CompileResult<SelectExpression> {
    let lowered = item.trim().to_lowercase();
    let mut parts = lowered.split(" as ");
    let expr = parts.next().unwrap_or_default();
    let alias = parts
        .next()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty());

    let (field, customizer) = parse_customizer(expr)?;
    let field = field.trim();
    if field.is_empty() {
        return Err(CompileError::EmptySelectField { index });
    }

    Ok(SelectExpression {
        field: field.to_string(),
        alias,
        customizer,
    })
}

/// Split a select expression into its field path and customizer.
pub fn parse_customizer(expr: &str) -> CompileResult<(&str, Option<Customizer>)> {
    let mut resources = expr.split('~');
    let field = resources.next().unwrap_or_default();
    if let Some(index) = resources.next() {
        let index = index
            .trim()
            .parse::<i64>()
            .map_err(|_| CompileError::InvalidResourceIndex {
                expr: expr.to_string(),
            })?;
        return Ok((field, Some(Customizer::ResourceIndex(index))));
    }

    let mut nested = expr.split(':');
    let field = nested.next().unwrap_or_default();
    if let Some(path) = nested.next() {
        let path = path.trim();
        if path.is_empty() {
            return Err(CompileError::EmptyNestedPath {
                expr: expr.to_string(),
            });
        }
        return Ok((field, Some(Customizer::NestedField(path.to_string()))));
    }

    Ok((expr, None))
}
