//! Macro substitution over query text.

use std::sync::LazyLock;

use chrono::Days;
use regex::Regex;
use tracing::debug;

use super::clock::Clock;
use super::date::{is_date_literal, resolve_date_literal};
use super::error::{MacroError, MacroResult};
use super::expr::{self, EvalContext};
use super::value::{MacroMap, MacroValue};

/// `{name}`. A match whose `{` directly follows `$` opens an expression block
/// and is skipped, see [`replace_placeholders`].
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([^}]+)\}").unwrap());

static EXPRESSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]*)\}").unwrap());

/// Names of the macros injected when the caller doesn't supply them.
pub const BUILTIN_MACROS: [&str; 4] = ["date_iso", "yesterday_iso", "current_date", "current_datetime"];

/// Text after substitution plus the placeholders nobody defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub text: String,
    /// Unknown `{name}` placeholders in first-seen order, without duplicates.
    pub unresolved: Vec<String>,
}

/// Substitute macros into `text` and evaluate `${...}` blocks.
///
/// `macros` is updated in place: dynamic date literals are replaced by their
/// resolved dates and missing built-ins are added.
pub fn substitute(text: &str, macros: &mut MacroMap, clock: &dyn Clock) -> MacroResult<Substitution> {
    resolve_dates(macros, clock)?;
    inject_builtins(macros, clock);

    let mut unresolved: Vec<String> = Vec::new();
    let text = replace_placeholders(text, macros, &mut unresolved);

    let text = evaluate_expressions(&text, macros, clock)?;

    if !unresolved.is_empty() {
        debug!(?unresolved, "unresolved macros left in query text");
    }

    Ok(Substitution { text, unresolved })
}

/// Replace `{name}` placeholders, leaving unknown ones verbatim.
///
/// The `{` of a `${` is never a placeholder start, but the search resumes
/// right after it, so `${ {days} * 2 }` still has `{days}` replaced before the
/// expression is evaluated.
fn replace_placeholders(text: &str, macros: &MacroMap, unresolved: &mut Vec<String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut at = 0;

    while let Some(caps) = PLACEHOLDER.captures_at(text, at) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        if text[..whole.start()].ends_with('$') {
            at = whole.start() + 1;
            continue;
        }

        out.push_str(&text[last..whole.start()]);
        let name = name.as_str();
        match macros.get(name) {
            Some(value) => out.push_str(&value.to_string()),
            None => {
                if !unresolved.iter().any(|n| n == name) {
                    unresolved.push(name.to_string());
                }
                out.push_str(whole.as_str());
            }
        }
        last = whole.end();
        at = whole.end();
    }
    out.push_str(&text[last..]);

    out
}

/// Rewrite every `:YYYY...` macro value to an ISO date.
fn resolve_dates(macros: &mut MacroMap, clock: &dyn Clock) -> MacroResult<()> {
    let today = clock.today();
    for (name, value) in macros.iter_mut() {
        let MacroValue::Str(raw) = &*value else {
            continue;
        };
        if is_date_literal(raw) {
            let resolved = resolve_date_literal(name, raw, today)?;
            debug!(macro_name = %name, from = %raw, to = %resolved, "resolved date macro");
            *value = MacroValue::Str(resolved);
        }
    }
    Ok(())
}

fn inject_builtins(macros: &mut MacroMap, clock: &dyn Clock) {
    let now = clock.now();
    let today = now.date();
    let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);

    let builtins = [
        ("date_iso", today.format("%Y%m%d").to_string()),
        ("yesterday_iso", yesterday.format("%Y%m%d").to_string()),
        ("current_date", today.format("%Y-%m-%d").to_string()),
        ("current_datetime", now.format("%Y-%m-%d %H:%M:%S").to_string()),
    ];
    for (name, value) in builtins {
        macros
            .entry(name.to_string())
            .or_insert_with(|| MacroValue::Str(value));
    }
}

fn evaluate_expressions(text: &str, macros: &MacroMap, clock: &dyn Clock) -> MacroResult<String> {
    let ctx = EvalContext::new(macros, clock);
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in EXPRESSION.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let source = &caps[1];
        out.push_str(&text[last..whole.start()]);
        if !source.trim().is_empty() {
            let value = expr::evaluate(source, &ctx).map_err(|source_err| MacroError::Expression {
                expr: source.to_string(),
                source: source_err,
            })?;
            out.push_str(&value.to_string());
        }
        last = whole.end();
    }
    out.push_str(&text[last..]);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macros::clock::FixedClock;

    fn clock() -> FixedClock {
        FixedClock::at_date(2024, 3, 15).unwrap()
    }

    fn macros(pairs: &[(&str, &str)]) -> MacroMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), MacroValue::from(*v)))
            .collect()
    }

    #[test]
    fn test_plain_placeholders() {
        let mut m = macros(&[("start", "2024-01-01")]);
        let result = substitute("WHERE date >= '{start}'", &mut m, &clock()).unwrap();
        assert_eq!(result.text, "WHERE date >= '2024-01-01'");
        assert!(result.unresolved.is_empty());
    }

    #[test]
    fn test_unknown_placeholders_left_verbatim() {
        let mut m = MacroMap::new();
        let result = substitute("{a} {b} {a} {}", &mut m, &clock()).unwrap();
        assert_eq!(result.text, "{a} {b} {a} {}");
        assert_eq!(result.unresolved, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_builtins_injected() {
        let mut m = MacroMap::new();
        let result = substitute(
            "{date_iso} {yesterday_iso} {current_date} {current_datetime}",
            &mut m,
            &clock(),
        )
        .unwrap();
        assert_eq!(result.text, "20240315 20240314 2024-03-15 2024-03-15 00:00:00");
        for name in BUILTIN_MACROS {
            assert!(m.contains_key(name));
        }
    }

    #[test]
    fn test_user_value_beats_builtin() {
        let mut m = macros(&[("date_iso", "19990101")]);
        let result = substitute("{date_iso}", &mut m, &clock()).unwrap();
        assert_eq!(result.text, "19990101");
    }

    #[test]
    fn test_date_macro_rewrites_map() {
        let mut m = macros(&[("start", ":YYYYMMDD-1")]);
        let result = substitute("'{start}'", &mut m, &clock()).unwrap();
        assert_eq!(result.text, "'2024-03-14'");
        assert_eq!(m["start"], MacroValue::from("2024-03-14"));
    }

    #[test]
    fn test_expressions() {
        let mut m = macros(&[("days", "7")]);
        let result = substitute("LIMIT ${days * 2} ${} ${ }", &mut m, &clock()).unwrap();
        assert_eq!(result.text, "LIMIT 14  ");
    }

    #[test]
    fn test_placeholder_inside_expression() {
        let mut m = macros(&[("days", "7"), ("label", "camp")]);
        let result = substitute(
            "LIMIT ${ {days} * 2 } ${upper('{label}')} ${days}",
            &mut m,
            &clock(),
        )
        .unwrap();
        assert_eq!(result.text, "LIMIT 14 CAMP 7");
        assert!(result.unresolved.is_empty());
    }

    #[test]
    fn test_unknown_placeholder_inside_expression() {
        let mut m = MacroMap::new();
        let err = substitute("${ {missing} + 1 }", &mut m, &clock()).unwrap_err();
        assert!(matches!(err, MacroError::Expression { .. }));
    }

    #[test]
    fn test_expression_error() {
        let mut m = MacroMap::new();
        let err = substitute("${1 +}", &mut m, &clock()).unwrap_err();
        assert!(matches!(err, MacroError::Expression { ref expr, .. } if expr == "1 +"));
    }

    #[test]
    fn test_no_placeholders_is_identity() {
        let text = "SELECT campaign.id FROM campaign WHERE x = 'a:b' -- $ sign";
        let mut m = macros(&[("x", "1")]);
        assert_eq!(substitute(text, &mut m, &clock()).unwrap().text, text);
    }
}
