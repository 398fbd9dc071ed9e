//! Template rendering over query text.
//!
//! Queries may contain Handlebars directives (`{{#if}}`, `{{#each}}`, ...)
//! evaluated against a parameter map. String parameters are split on `,`
//! before rendering so comma-lists can be iterated:
//!
//! ```text
//! SELECT {{#each cols}}{{this}}{{#unless @last}}, {{/unless}}{{/each}} FROM campaign
//! ```
//!
//! With `cols = "campaign.id,campaign.name"` this renders both fields.
//! A split value renders as a list, so use `{{join cols}}` to print it back
//! as a single string.

use handlebars::Handlebars;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Template parameters by name.
pub type TemplateParams = Map<String, Value>;

const TEMPLATE_NAME: &str = "query";

#[derive(Debug, Error)]
pub enum TemplateError {
    /// The template text itself is malformed.
    #[error("template syntax error: {0}")]
    Syntax(#[source] Box<handlebars::TemplateError>),

    #[error("template rendering failed: {0}")]
    Render(#[source] Box<handlebars::RenderError>),
}

/// Render `template` with `params`.
pub fn render(template: &str, params: &TemplateParams) -> Result<String, TemplateError> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.register_helper("upper", Box::new(upper_helper));
    handlebars.register_helper("lower", Box::new(lower_helper));
    handlebars.register_helper("join", Box::new(join_helper));

    handlebars
        .register_template_string(TEMPLATE_NAME, template)
        .map_err(|e| TemplateError::Syntax(Box::new(e)))?;

    let data = Value::Object(split_params(params));
    debug!(params = params.len(), "rendering query template");

    handlebars
        .render(TEMPLATE_NAME, &data)
        .map_err(|e| TemplateError::Render(Box::new(e)))
}

/// Split every non-empty string parameter on `,`. Other values pass through.
pub fn split_params(params: &TemplateParams) -> TemplateParams {
    params
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) if !s.is_empty() => Value::Array(
                    s.split(',')
                        .map(|part| Value::String(part.to_string()))
                        .collect(),
                ),
                other => other.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(display).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

// Handlebars helpers

fn upper_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let param = h.param(0).map(|v| display(v.value())).unwrap_or_default();
    out.write(&param.to_uppercase())?;
    Ok(())
}

fn lower_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let param = h.param(0).map(|v| display(v.value())).unwrap_or_default();
    out.write(&param.to_lowercase())?;
    Ok(())
}

/// `{{join list [sep]}}`, separator defaults to `,`.
fn join_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let separator = h
        .param(1)
        .and_then(|v| v.value().as_str().map(str::to_string))
        .unwrap_or_else(|| ",".to_string());

    let joined = match h.param(0).map(|v| v.value()) {
        Some(Value::Array(items)) => items
            .iter()
            .map(display)
            .collect::<Vec<_>>()
            .join(&separator),
        Some(other) => display(other),
        None => String::new(),
    };
    out.write(&joined)?;
    Ok(())
}
