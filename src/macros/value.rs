//! Macro values.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Macro name → value. Passed as `&mut` because date literals are rewritten
/// in place and built-in macros are added when missing.
pub type MacroMap = HashMap<String, MacroValue>;

/// A scalar macro value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MacroValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl MacroValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MacroValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for MacroValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacroValue::Bool(b) => write!(f, "{}", b),
            MacroValue::Int(i) => write!(f, "{}", i),
            MacroValue::Float(x) => write!(f, "{}", x),
            MacroValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MacroValue {
    fn from(s: &str) -> Self {
        MacroValue::Str(s.to_string())
    }
}

impl From<String> for MacroValue {
    fn from(s: String) -> Self {
        MacroValue::Str(s)
    }
}

impl From<i64> for MacroValue {
    fn from(i: i64) -> Self {
        MacroValue::Int(i)
    }
}

impl From<f64> for MacroValue {
    fn from(x: f64) -> Self {
        MacroValue::Float(x)
    }
}

impl From<bool> for MacroValue {
    fn from(b: bool) -> Self {
        MacroValue::Bool(b)
    }
}

/// Parse a `name=value` pair as given on the command line.
pub fn parse_assignment(s: &str) -> Option<(String, MacroValue)> {
    let (name, value) = s.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), MacroValue::Str(value.to_string())))
}
