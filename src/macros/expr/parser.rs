//! Parser for `${...}` expressions using chumsky.
//!
//! ```text
//! ternary := or ('?' ternary ':' ternary)?
//! or      := and (('or' | '||') and)*
//! and     := cmp (('and' | '&&') cmp)*
//! cmp     := add (('==' | '!=' | '<' | '<=' | '>' | '>=') add)?
//! add     := mul (('+' | '-') mul)*
//! mul     := unary (('*' | '/' | '%') unary)*
//! unary   := ('-' | '+' | 'not' | '!') unary | pow
//! pow     := primary ('^' unary)?
//! primary := number | string | 'true' | 'false' | ident | ident '(' args ')' | '(' ternary ')'
//! ```

use chumsky::input::{Input, ValueInput};
use chumsky::prelude::*;

use super::lexer::Token;
use super::{syntax_error, EvalResult};

/// Expression AST.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Str(String),
    Bool(bool),
    /// Variable reference (a macro name).
    Var(String),
    UnaryOp {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "^",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    Expr::BinaryOp {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

/// Create the expression parser.
///
/// Generic over any `ValueInput` producing `Token` values with `SimpleSpan`
/// spans, so it runs directly on the lexer's output.
pub fn parser<'tokens, 'src: 'tokens, I>(
) -> impl Parser<'tokens, I, Expr, extra::Err<Rich<'tokens, Token<'src>, SimpleSpan>>> + Clone
where
    I: ValueInput<'tokens, Token = Token<'src>, Span = SimpleSpan>,
{
    recursive(|expr| {
        // ======================================================================
        // Operands
        // ======================================================================

        let literal = select! {
            Token::Number(n) => Expr::Number(n),
            Token::Str(s) => Expr::Str(s.to_string()),
            Token::True => Expr::Bool(true),
            Token::False => Expr::Bool(false),
        }
        .labelled("literal");

        let ident = select! {
            Token::Ident(s) => s.to_string(),
        }
        .labelled("identifier");

        let args = expr
            .clone()
            .separated_by(just(Token::Comma))
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LParen), just(Token::RParen));

        let call_or_var = ident.then(args.or_not()).map(|(name, args)| match args {
            Some(args) => Expr::Call { name, args },
            None => Expr::Var(name),
        });

        let primary = choice((
            literal,
            call_or_var,
            expr.clone()
                .delimited_by(just(Token::LParen), just(Token::RParen)),
        ))
        .labelled("operand");

        // ======================================================================
        // Unary and power
        // ======================================================================

        // `^` is right-associative and binds tighter than unary minus on its left.
        let unary = recursive(|unary| {
            let power = primary
                .then(just(Token::Caret).ignore_then(unary).or_not())
                .map(|(base, exponent)| match exponent {
                    Some(exponent) => binary(base, BinaryOp::Pow, exponent),
                    None => base,
                });

            let op = select! {
                Token::Minus => UnaryOp::Neg,
                Token::Plus => UnaryOp::Plus,
                Token::Not => UnaryOp::Not,
            };

            op.repeated().foldr(power, |op, expr| Expr::UnaryOp {
                op,
                expr: Box::new(expr),
            })
        });

        // ======================================================================
        // Binary operators, tightest first
        // ======================================================================

        let product = unary.clone().foldl(
            select! {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::Percent => BinaryOp::Mod,
            }
            .then(unary)
            .repeated(),
            |left, (op, right)| binary(left, op, right),
        );

        let sum = product.clone().foldl(
            select! {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
            }
            .then(product)
            .repeated(),
            |left, (op, right)| binary(left, op, right),
        );

        // Comparisons don't chain.
        let comparison = sum
            .clone()
            .then(
                select! {
                    Token::EqEq => BinaryOp::Eq,
                    Token::NotEq => BinaryOp::Ne,
                    Token::Lt => BinaryOp::Lt,
                    Token::Le => BinaryOp::Le,
                    Token::Gt => BinaryOp::Gt,
                    Token::Ge => BinaryOp::Ge,
                }
                .then(sum)
                .or_not(),
            )
            .map(|(left, rest)| match rest {
                Some((op, right)) => binary(left, op, right),
                None => left,
            });

        let and = comparison.clone().foldl(
            just(Token::And).to(BinaryOp::And).then(comparison).repeated(),
            |left, (op, right)| binary(left, op, right),
        );

        let or = and.clone().foldl(
            just(Token::Or).to(BinaryOp::Or).then(and).repeated(),
            |left, (op, right)| binary(left, op, right),
        );

        or.then(
            just(Token::Question)
                .ignore_then(expr.clone())
                .then_ignore(just(Token::Colon))
                .then(expr)
                .or_not(),
        )
        .map(|(cond, branches)| match branches {
            Some((then, otherwise)) => Expr::Conditional {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            },
            None => cond,
        })
    })
}

/// Parse lexed tokens into a single expression. `eoi` is the source length.
pub fn parse_tokens(tokens: &[(Token<'_>, SimpleSpan)], eoi: usize) -> EvalResult<Expr> {
    let token_stream = tokens.map(
        (eoi..eoi).into(),
        |(tok, span): &(Token<'_>, SimpleSpan)| (tok, span),
    );
    parser()
        .then_ignore(end())
        .parse(token_stream)
        .into_result()
        .map_err(syntax_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macros::expr::{parse, EvalError};

    #[test]
    fn test_precedence() {
        assert_eq!(
            parse("1 + 2 * 3").unwrap(),
            binary(
                Expr::Number(1.0),
                BinaryOp::Add,
                binary(Expr::Number(2.0), BinaryOp::Mul, Expr::Number(3.0))
            )
        );
        assert_eq!(
            parse("a or b and c").unwrap(),
            binary(
                Expr::Var("a".to_string()),
                BinaryOp::Or,
                binary(
                    Expr::Var("b".to_string()),
                    BinaryOp::And,
                    Expr::Var("c".to_string())
                )
            )
        );
    }

    #[test]
    fn test_left_assoc() {
        assert_eq!(
            parse("8 - 4 - 2").unwrap(),
            binary(
                binary(Expr::Number(8.0), BinaryOp::Sub, Expr::Number(4.0)),
                BinaryOp::Sub,
                Expr::Number(2.0)
            )
        );
    }

    #[test]
    fn test_power_right_assoc() {
        assert_eq!(
            parse("2 ^ 3 ^ 2").unwrap(),
            binary(
                Expr::Number(2.0),
                BinaryOp::Pow,
                binary(Expr::Number(3.0), BinaryOp::Pow, Expr::Number(2.0))
            )
        );
    }

    #[test]
    fn test_unary_binds_looser_than_power() {
        assert_eq!(
            parse("-2 ^ 2").unwrap(),
            Expr::UnaryOp {
                op: UnaryOp::Neg,
                expr: Box::new(binary(Expr::Number(2.0), BinaryOp::Pow, Expr::Number(2.0))),
            }
        );
        assert_eq!(
            parse("2 ^ -1").unwrap(),
            binary(
                Expr::Number(2.0),
                BinaryOp::Pow,
                Expr::UnaryOp {
                    op: UnaryOp::Neg,
                    expr: Box::new(Expr::Number(1.0)),
                }
            )
        );
    }

    #[test]
    fn test_call_and_ternary() {
        let expr = parse("x > 1 ? max(x, 2) : 'none'").unwrap();
        let Expr::Conditional { then, otherwise, .. } = expr else {
            panic!("expected conditional");
        };
        assert_eq!(
            *then,
            Expr::Call {
                name: "max".to_string(),
                args: vec![Expr::Var("x".to_string()), Expr::Number(2.0)],
            }
        );
        assert_eq!(*otherwise, Expr::Str("none".to_string()));
    }

    #[test]
    fn test_empty_call() {
        assert_eq!(
            parse("today()").unwrap(),
            Expr::Call {
                name: "today".to_string(),
                args: vec![],
            }
        );
    }

    #[test]
    fn test_errors() {
        for source in ["1 +", "(1 + 2", "1 2", "f(1,)", "a ? b", "1 < 2 < 3", ""] {
            assert!(
                matches!(parse(source), Err(EvalError::Syntax { .. })),
                "{:?} should fail to parse",
                source
            );
        }
        let Err(EvalError::Syntax { offset, .. }) = parse("1 2") else {
            panic!("expected a syntax error");
        };
        assert_eq!(offset, 2);
    }
}
