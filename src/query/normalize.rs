//! Query normalization: the text actually sent to the reporting service.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::error::{CompileError, CompileResult};
use super::text::select_span;

/// Parameters substituted into `{name}` placeholders at normalization time.
pub type QueryParams = HashMap<String, String>;

static ALIAS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s+as\s+\w+").unwrap());

static CUSTOMIZER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"->\w*|~-?\w+|:[^\s,]*").unwrap());

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i),\s*FROM\s").unwrap());

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([^}]+)\}").unwrap());

/// Strip aliases and customizers from the select list, drop a trailing comma
/// before `FROM` and substitute `{name}` placeholders from `params`.
///
/// Unlike macro substitution this is strict: every placeholder must have a
/// value, otherwise all missing names are reported together.
pub fn normalize_query(query: &str, params: &QueryParams) -> CompileResult<String> {
    let text = match select_span(query) {
        Some(span) => {
            let select = remove_customizers(&remove_aliases(&query[span.clone()]));
            format!("{}{}{}", &query[..span.start], select, &query[span.end..])
        }
        None => query.to_string(),
    };
    let text = TRAILING_COMMA.replace_all(&text, " FROM ");

    let mut unknown: Vec<String> = Vec::new();
    let text = PLACEHOLDER.replace_all(&text, |caps: &Captures| {
        let name = &caps[1];
        match params.get(name) {
            Some(value) => value.clone(),
            None => {
                if !unknown.iter().any(|u| u == name) {
                    unknown.push(name.to_string());
                }
                String::new()
            }
        }
    });

    if !unknown.is_empty() {
        return Err(CompileError::UnresolvedParams(unknown));
    }
    Ok(text.into_owned())
}

fn remove_aliases(select: &str) -> String {
    ALIAS.replace_all(select, "").into_owned()
}

fn remove_customizers(select: &str) -> String {
    CUSTOMIZER.replace_all(select, "").into_owned()
}
