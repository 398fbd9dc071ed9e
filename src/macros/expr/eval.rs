//! Tree-walking evaluator for parsed expressions.

use std::fmt;

use crate::macros::clock::Clock;
use crate::macros::date::shift_days;
use crate::macros::value::{MacroMap, MacroValue};

use super::parser::{BinaryOp, Expr, UnaryOp};
use super::{EvalError, EvalResult};

/// Runtime value of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Str(String),
    Bool(bool),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Bool(_) => "boolean",
        }
    }

    /// Numeric view; strings holding a number coerce.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Str(s) => s.trim().parse::<f64>().ok(),
            Value::Bool(_) => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Bool(b) => *b,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Str(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&MacroValue> for Value {
    fn from(value: &MacroValue) -> Self {
        match value {
            MacroValue::Bool(b) => Value::Bool(*b),
            MacroValue::Int(i) => Value::Number(*i as f64),
            MacroValue::Float(x) => Value::Number(*x),
            MacroValue::Str(s) => Value::Str(s.clone()),
        }
    }
}

/// Integral values print without a fractional part (`3`, not `3.0`).
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Variables and clock visible to an expression.
pub struct EvalContext<'a> {
    vars: &'a MacroMap,
    clock: &'a dyn Clock,
}

impl<'a> EvalContext<'a> {
    pub fn new(vars: &'a MacroMap, clock: &'a dyn Clock) -> Self {
        Self { vars, clock }
    }

    pub fn eval(&self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Var(name) => self.lookup(name),
            Expr::UnaryOp { op, expr } => {
                let value = self.eval(expr)?;
                eval_unary(*op, value)
            }
            Expr::BinaryOp { left, op, right } => match op {
                BinaryOp::And => {
                    let left = self.eval(left)?;
                    if !left.is_truthy() {
                        return Ok(Value::Bool(false));
                    }
                    Ok(Value::Bool(self.eval(right)?.is_truthy()))
                }
                BinaryOp::Or => {
                    let left = self.eval(left)?;
                    if left.is_truthy() {
                        return Ok(Value::Bool(true));
                    }
                    Ok(Value::Bool(self.eval(right)?.is_truthy()))
                }
                _ => {
                    let left = self.eval(left)?;
                    let right = self.eval(right)?;
                    eval_binary(*op, left, right)
                }
            },
            Expr::Conditional {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(cond)?.is_truthy() {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            Expr::Call { name, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<EvalResult<Vec<_>>>()?;
                self.call(name, &args)
            }
        }
    }

    fn lookup(&self, name: &str) -> EvalResult<Value> {
        if let Some(value) = self.vars.get(name) {
            return Ok(Value::from(value));
        }
        match name {
            "pi" => Ok(Value::Number(std::f64::consts::PI)),
            "e" => Ok(Value::Number(std::f64::consts::E)),
            _ => Err(EvalError::UnknownVariable(name.to_string())),
        }
    }

    fn call(&self, name: &str, args: &[Value]) -> EvalResult<Value> {
        match name {
            "abs" => unary_math(name, args, f64::abs),
            "ceil" => unary_math(name, args, f64::ceil),
            "floor" => unary_math(name, args, f64::floor),
            "trunc" => unary_math(name, args, f64::trunc),
            "sqrt" => unary_math(name, args, f64::sqrt),
            "exp" => unary_math(name, args, f64::exp),
            "log" => unary_math(name, args, f64::ln),
            "log10" => unary_math(name, args, f64::log10),
            "sign" => unary_math(name, args, |x| if x == 0.0 { 0.0 } else { x.signum() }),
            "round" => {
                check_arity(name, args, 1, 2, "1 or 2")?;
                let x = number_arg(name, &args[0])?;
                let digits = match args.get(1) {
                    Some(arg) => number_arg(name, arg)?,
                    None => 0.0,
                };
                let factor = 10f64.powi(digits as i32);
                Ok(Value::Number((x * factor).round() / factor))
            }
            "pow" => {
                check_arity(name, args, 2, 2, "2")?;
                let base = number_arg(name, &args[0])?;
                let exponent = number_arg(name, &args[1])?;
                Ok(Value::Number(base.powf(exponent)))
            }
            "mod" => {
                check_arity(name, args, 2, 2, "2")?;
                eval_binary(BinaryOp::Mod, args[0].clone(), args[1].clone())
            }
            "min" | "max" => {
                check_arity(name, args, 1, usize::MAX, "at least 1")?;
                let mut result = number_arg(name, &args[0])?;
                for arg in &args[1..] {
                    let x = number_arg(name, arg)?;
                    result = if name == "min" { result.min(x) } else { result.max(x) };
                }
                Ok(Value::Number(result))
            }
            "upper" => {
                check_arity(name, args, 1, 1, "1")?;
                Ok(Value::Str(args[0].to_string().to_uppercase()))
            }
            "lower" => {
                check_arity(name, args, 1, 1, "1")?;
                Ok(Value::Str(args[0].to_string().to_lowercase()))
            }
            "len" => {
                check_arity(name, args, 1, 1, "1")?;
                Ok(Value::Number(args[0].to_string().chars().count() as f64))
            }
            "concat" => Ok(Value::Str(args.iter().map(Value::to_string).collect())),
            "today" => {
                check_arity(name, args, 0, 1, "0 or 1")?;
                let days = match args.first() {
                    Some(arg) => day_count(number_arg(name, arg)?)?,
                    None => 0,
                };
                let date = days
                    .checked_neg()
                    .and_then(|delta| shift_days(self.clock.today(), delta))
                    .ok_or(EvalError::DateOutOfRange)?;
                Ok(Value::Str(date.format("%Y-%m-%d").to_string()))
            }
            "yesterday" => {
                check_arity(name, args, 0, 0, "0")?;
                let date = shift_days(self.clock.today(), 1).ok_or(EvalError::DateOutOfRange)?;
                Ok(Value::Str(date.format("%Y-%m-%d").to_string()))
            }
            "now" => {
                check_arity(name, args, 0, 0, "0")?;
                Ok(Value::Str(
                    self.clock.now().format("%Y-%m-%d %H:%M:%S").to_string(),
                ))
            }
            _ => Err(EvalError::UnknownFunction(name.to_string())),
        }
    }
}

fn check_arity(
    name: &str,
    args: &[Value],
    min: usize,
    max: usize,
    expected: &'static str,
) -> EvalResult<()> {
    if args.len() < min || args.len() > max {
        return Err(EvalError::Arity {
            function: name.to_string(),
            expected,
            found: args.len(),
        });
    }
    Ok(())
}

fn number_arg(name: &str, value: &Value) -> EvalResult<f64> {
    value.as_number().ok_or_else(|| EvalError::TypeMismatch {
        op: name.to_string(),
        found: value.type_name(),
    })
}

/// Whole days from a numeric argument, truncated toward zero.
fn day_count(days: f64) -> EvalResult<i64> {
    // Beyond this chrono has no representable date anyway.
    const MAX_DAYS: f64 = 1e9;
    if !days.is_finite() || days.abs() > MAX_DAYS {
        return Err(EvalError::DateOutOfRange);
    }
    Ok(days.trunc() as i64)
}

fn unary_math(name: &str, args: &[Value], f: impl Fn(f64) -> f64) -> EvalResult<Value> {
    check_arity(name, args, 1, 1, "1")?;
    Ok(Value::Number(f(number_arg(name, &args[0])?)))
}

fn eval_unary(op: UnaryOp, value: Value) -> EvalResult<Value> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
        UnaryOp::Neg => Ok(Value::Number(-number_arg("-", &value)?)),
        UnaryOp::Plus => Ok(Value::Number(number_arg("+", &value)?)),
    }
}

fn eval_binary(op: BinaryOp, left: Value, right: Value) -> EvalResult<Value> {
    let symbol = op.symbol();

    if op == BinaryOp::Add {
        if let (Some(l), Some(r)) = (left.as_number(), right.as_number()) {
            return Ok(Value::Number(l + r));
        }
        if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) {
            return Ok(Value::Str(format!("{}{}", left, right)));
        }
    }

    if matches!(op, BinaryOp::Eq | BinaryOp::Ne) {
        let equal = match (left.as_number(), right.as_number()) {
            (Some(l), Some(r)) => l == r,
            _ => left.to_string() == right.to_string(),
        };
        return Ok(Value::Bool(equal == (op == BinaryOp::Eq)));
    }

    if matches!(op, BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge) {
        let ordering = match (&left, &right, left.as_number(), right.as_number()) {
            (_, _, Some(l), Some(r)) => l.partial_cmp(&r),
            (Value::Str(l), Value::Str(r), _, _) => Some(l.cmp(r)),
            _ => {
                let bad = if left.as_number().is_none() { &left } else { &right };
                return Err(EvalError::TypeMismatch {
                    op: symbol.to_string(),
                    found: bad.type_name(),
                });
            }
        };
        let result = match ordering {
            None => false,
            Some(ord) => match op {
                BinaryOp::Lt => ord.is_lt(),
                BinaryOp::Le => ord.is_le(),
                BinaryOp::Gt => ord.is_gt(),
                _ => ord.is_ge(),
            },
        };
        return Ok(Value::Bool(result));
    }

    let l = number_arg(symbol, &left)?;
    let r = number_arg(symbol, &right)?;
    let n = match op {
        BinaryOp::Add => l + r,
        BinaryOp::Sub => l - r,
        BinaryOp::Mul => l * r,
        BinaryOp::Div | BinaryOp::Mod if r == 0.0 => return Err(EvalError::DivisionByZero),
        BinaryOp::Div => l / r,
        // Sign follows the divisor, as in floored modulo.
        BinaryOp::Mod => l - r * (l / r).floor(),
        BinaryOp::Pow => l.powf(r),
        _ => unreachable!("logical and comparison operators handled above"),
    };
    Ok(Value::Number(n))
}

#[cfg(test)]
mod tests {
    use super::super::evaluate;
    use super::*;
    use crate::macros::clock::FixedClock;

    fn clock() -> FixedClock {
        let now = chrono::NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        FixedClock::new(now)
    }

    fn eval_with(source: &str, vars: &MacroMap) -> EvalResult<Value> {
        let clock = clock();
        let ctx = EvalContext::new(vars, &clock);
        evaluate(source, &ctx)
    }

    fn eval_str(source: &str) -> String {
        eval_with(source, &MacroMap::new()).unwrap().to_string()
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval_str("1 + 2 * 3"), "7");
        assert_eq!(eval_str("(1 + 2) * 3"), "9");
        assert_eq!(eval_str("7 / 2"), "3.5");
        assert_eq!(eval_str("2 ^ 10"), "1024");
        assert_eq!(eval_str("-2 ^ 2"), "-4");
        assert_eq!(eval_str("-7 % 3"), "2");
    }

    #[test]
    fn test_functions() {
        assert_eq!(eval_str("round(3.14159, 2)"), "3.14");
        assert_eq!(eval_str("max(1, 5, 3)"), "5");
        assert_eq!(eval_str("sqrt(16)"), "4");
        assert_eq!(eval_str("upper('abc')"), "ABC");
        assert_eq!(eval_str("concat('a', 1, true)"), "a1true");
        assert_eq!(eval_str("len('hello')"), "5");
    }

    #[test]
    fn test_date_functions() {
        assert_eq!(eval_str("today()"), "2024-03-15");
        assert_eq!(eval_str("today(-1)"), "2024-03-14");
        assert_eq!(eval_str("yesterday()"), "2024-03-14");
        assert_eq!(eval_str("now()"), "2024-03-15 10:30:00");
    }

    #[test]
    fn test_today_out_of_range() {
        let vars = MacroMap::new();
        for source in [
            "today(-99999999999999999999)",
            "today(99999999999999999999)",
            "today(-9223372036854775808)",
            "today(1e300)",
            "today(sqrt(-1))",
            "today(-999999999)",
        ] {
            assert_eq!(
                eval_with(source, &vars),
                Err(EvalError::DateOutOfRange),
                "{}",
                source
            );
        }
        assert_eq!(eval_str("today(1.9)"), "2024-03-16");
    }

    #[test]
    fn test_variables_and_coercion() {
        let mut vars = MacroMap::new();
        vars.insert("days".to_string(), MacroValue::from("7"));
        vars.insert("n".to_string(), MacroValue::from(3));
        vars.insert("name".to_string(), MacroValue::from("camp"));

        assert_eq!(eval_with("days * 2", &vars).unwrap().to_string(), "14");
        assert_eq!(eval_with("n + 1", &vars).unwrap().to_string(), "4");
        assert_eq!(eval_with("name + '_x'", &vars).unwrap().to_string(), "camp_x");
        assert_eq!(
            eval_with("n > 2 ? 'big' : 'small'", &vars).unwrap(),
            Value::Str("big".to_string())
        );
    }

    #[test]
    fn test_logic() {
        assert_eq!(eval_str("1 < 2 and 'a' == 'a'"), "true");
        assert_eq!(eval_str("not true || false"), "false");
        // Short-circuit skips the unknown variable.
        assert_eq!(eval_str("false && missing"), "false");
    }

    #[test]
    fn test_errors() {
        let vars = MacroMap::new();
        assert_eq!(
            eval_with("missing + 1", &vars),
            Err(EvalError::UnknownVariable("missing".to_string()))
        );
        assert_eq!(
            eval_with("nope(1)", &vars),
            Err(EvalError::UnknownFunction("nope".to_string()))
        );
        assert_eq!(eval_with("1 / 0", &vars), Err(EvalError::DivisionByZero));
        assert!(matches!(
            eval_with("sqrt(1, 2)", &vars),
            Err(EvalError::Arity { .. })
        ));
        assert!(matches!(
            eval_with("'a' * 2", &vars),
            Err(EvalError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.5), "0.5");
    }
}
