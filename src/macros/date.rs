//! Dynamic date macro literals.
//!
//! A macro value of the form `:YYYYMMDD-N`, `:YYYYMM-N` or `:YYYY-N` is
//! replaced by an ISO date (`yyyy-MM-dd`) N days, months or years before
//! today. `N` defaults to 0 and may be negative (`:YYYYMMDD--1` is tomorrow).
//! Month literals resolve to the first day of the month.

use std::sync::LazyLock;

use chrono::{Datelike, Days, Months, NaiveDate};
use regex::Regex;

use super::error::{MacroError, MacroResult};

static DATE_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*:(YYYYMMDD|YYYYMM|YYYY)\s*(?:-(.*))?$").unwrap());

/// Unit of a date literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePeriod {
    Day,
    Month,
    Year,
}

/// Whether a macro value should go through date resolution.
pub fn is_date_literal(value: &str) -> bool {
    value.starts_with(":YYYY")
}

/// Parse a date literal into its period and delta.
pub fn parse_date_literal(name: &str, value: &str) -> MacroResult<(DatePeriod, i64)> {
    let format_error = || MacroError::Format {
        name: name.to_string(),
        value: value.to_string(),
    };

    let caps = DATE_LITERAL.captures(value).ok_or_else(format_error)?;
    let period = match caps[1].to_uppercase().as_str() {
        "YYYYMMDD" => DatePeriod::Day,
        "YYYYMM" => DatePeriod::Month,
        _ => DatePeriod::Year,
    };

    let delta = match caps.get(2).map(|m| m.as_str().trim()) {
        None | Some("") => 0,
        Some(delta) => delta.parse::<i64>().map_err(|_| format_error())?,
    };

    Ok((period, delta))
}

/// Resolve a date literal relative to `today`.
pub fn resolve_date_literal(name: &str, value: &str, today: NaiveDate) -> MacroResult<String> {
    let (period, delta) = parse_date_literal(name, value)?;
    let out_of_range = || MacroError::DateOutOfRange {
        name: name.to_string(),
        value: value.to_string(),
    };

    let date = match period {
        DatePeriod::Day => shift_days(today, delta),
        DatePeriod::Month => shift_months(today, delta).and_then(|d| d.with_day(1)),
        DatePeriod::Year => delta.checked_mul(12).and_then(|m| shift_months(today, m)),
    }
    .ok_or_else(out_of_range)?;

    Ok(date.format("%Y-%m-%d").to_string())
}

/// `date` minus `delta` days.
pub(crate) fn shift_days(date: NaiveDate, delta: i64) -> Option<NaiveDate> {
    let days = Days::new(delta.unsigned_abs());
    if delta >= 0 {
        date.checked_sub_days(days)
    } else {
        date.checked_add_days(days)
    }
}

/// `date` minus `delta` months, clamping to the end of shorter months.
fn shift_months(date: NaiveDate, delta: i64) -> Option<NaiveDate> {
    let months = Months::new(u32::try_from(delta.unsigned_abs()).ok()?);
    if delta >= 0 {
        date.checked_sub_months(months)
    } else {
        date.checked_add_months(months)
    }
}
