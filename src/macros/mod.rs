//! Macro preprocessing for query text.
//!
//! Runs before compilation and is independent of the schema:
//!
//! 1. Dynamic date literals (`:YYYYMMDD-N`, `:YYYYMM-N`, `:YYYY-N`) in macro
//!    values are rewritten to ISO dates.
//! 2. Built-ins (`date_iso`, `yesterday_iso`, `current_date`,
//!    `current_datetime`) are added unless already present.
//! 3. `{name}` placeholders are replaced; unknown names are left as-is and
//!    reported back.
//! 4. `${expr}` blocks are evaluated with the macro map as variables.
//!
//! Current time is read through an injected [`Clock`].

pub mod clock;
pub mod date;
pub mod error;
pub mod expr;
pub mod substitute;
pub mod value;

pub use clock::{Clock, FixedClock, SystemClock};
pub use date::{parse_date_literal, resolve_date_literal, DatePeriod};
pub use error::{MacroError, MacroResult};
pub use expr::{EvalContext, EvalError, EvalResult, Value};
pub use substitute::{substitute, Substitution, BUILTIN_MACROS};
pub use value::{parse_assignment, MacroMap, MacroValue};
