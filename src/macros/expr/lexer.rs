//! Lexer for `${...}` expressions.
//!
//! Converts expression source into tokens with span information. Number
//! literals accept an optional fraction and exponent (`2`, `0.25`, `.5`,
//! `1e3`, `2.5E-2`).

use std::fmt;

use chumsky::prelude::*;

use super::{syntax_error, EvalResult};

/// A token in an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    // ========================================================================
    // Literals
    // ========================================================================
    Number(f64),
    /// A string literal (contents without quotes).
    Str(&'src str),
    /// An identifier (not a keyword).
    Ident(&'src str),

    // ========================================================================
    // Keywords
    // ========================================================================
    True,
    False,
    /// `and` or `&&`
    And,
    /// `or` or `||`
    Or,
    /// `not` or `!`
    Not,

    // ========================================================================
    // Symbols
    // ========================================================================
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
    Comma,
    Question,
    Colon,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Str(s) => write!(f, "'{}'", s),
            Token::Ident(s) => write!(f, "{}", s),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Not => write!(f, "not"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Caret => write!(f, "^"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Question => write!(f, "?"),
            Token::Colon => write!(f, ":"),
            Token::EqEq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::Le => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::Ge => write!(f, ">="),
        }
    }
}

/// Map an identifier to a keyword token or return Ident.
fn keyword_or_ident(s: &str) -> Token<'_> {
    match s {
        "true" => Token::True,
        "false" => Token::False,
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        _ => Token::Ident(s),
    }
}

/// Create the lexer.
pub fn lexer<'src>(
) -> impl Parser<'src, &'src str, Vec<(Token<'src>, SimpleSpan)>, extra::Err<Rich<'src, char>>> {
    let ident = text::ident().map(keyword_or_ident);

    // '...' or "..."
    let string_lit = choice((
        just('\'')
            .ignore_then(none_of('\'').repeated().to_slice())
            .then_ignore(just('\'')),
        just('"')
            .ignore_then(none_of('"').repeated().to_slice())
            .then_ignore(just('"')),
    ))
    .map(Token::Str);

    let fraction = just('.').then(text::digits(10));
    let exponent = one_of("eE")
        .then(one_of("+-").or_not())
        .then(text::digits(10));
    let number = choice((
        text::digits(10).then(fraction.clone().or_not()).ignored(),
        fraction.ignored(),
    ))
    .then(exponent.or_not())
    .to_slice()
    .try_map(|s: &str, span| {
        s.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| Rich::custom(span, format!("invalid number '{}'", s)))
    });

    // Symbols (multi-char first, then single-char)
    let symbol = choice((
        just("==").to(Token::EqEq),
        just("!=").to(Token::NotEq),
        just("<=").to(Token::Le),
        just(">=").to(Token::Ge),
        just("&&").to(Token::And),
        just("||").to(Token::Or),
        just('<').to(Token::Lt),
        just('>').to(Token::Gt),
        just('!').to(Token::Not),
        just('+').to(Token::Plus),
        just('-').to(Token::Minus),
        just('*').to(Token::Star),
        just('/').to(Token::Slash),
        just('%').to(Token::Percent),
        just('^').to(Token::Caret),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just(',').to(Token::Comma),
        just('?').to(Token::Question),
        just(':').to(Token::Colon),
    ));

    let token = choice((number, string_lit, ident, symbol)).map_with(|tok, e| (tok, e.span()));

    token
        .padded()
        .repeated()
        .collect()
        .padded()
        .then_ignore(end())
}

/// Lex an expression into tokens.
pub fn lex(source: &str) -> EvalResult<Vec<(Token<'_>, SimpleSpan)>> {
    lexer().parse(source).into_result().map_err(syntax_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macros::expr::EvalError;

    fn tokens(source: &str) -> Vec<Token<'_>> {
        lex(source).unwrap().into_iter().map(|(tok, _)| tok).collect()
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(
            tokens("1 + 2.5*x"),
            vec![
                Token::Number(1.0),
                Token::Plus,
                Token::Number(2.5),
                Token::Star,
                Token::Ident("x"),
            ]
        );
    }

    #[test]
    fn test_number_forms() {
        assert_eq!(
            tokens("1e3 2.5E-2 .5 7e+1"),
            vec![
                Token::Number(1000.0),
                Token::Number(0.025),
                Token::Number(0.5),
                Token::Number(70.0),
            ]
        );
        // A dangling exponent marker is the constant `e`.
        assert_eq!(tokens("2e"), vec![Token::Number(2.0), Token::Ident("e")]);
    }

    #[test]
    fn test_operators_and_keywords() {
        assert_eq!(
            tokens("a >= 1 && !b || c != 'x' and not true"),
            vec![
                Token::Ident("a"),
                Token::Ge,
                Token::Number(1.0),
                Token::And,
                Token::Not,
                Token::Ident("b"),
                Token::Or,
                Token::Ident("c"),
                Token::NotEq,
                Token::Str("x"),
                Token::And,
                Token::Not,
                Token::True,
            ]
        );
    }

    #[test]
    fn test_spans() {
        let spans: Vec<_> = lex("ab + \"c d\"")
            .unwrap()
            .into_iter()
            .map(|(_, span)| span.start..span.end)
            .collect();
        assert_eq!(spans, vec![0..2, 3..4, 5..10]);
    }

    #[test]
    fn test_errors() {
        for source in ["'abc", "1 # 2", "a = b"] {
            assert!(
                matches!(lex(source), Err(EvalError::Syntax { .. })),
                "{} should fail to lex",
                source
            );
        }
        let Err(EvalError::Syntax { offset, .. }) = lex("1 # 2") else {
            panic!("expected a syntax error");
        };
        assert_eq!(offset, 2);
    }
}
