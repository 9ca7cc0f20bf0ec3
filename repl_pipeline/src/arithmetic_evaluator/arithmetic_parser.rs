// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Integer arithmetic with the usual precedence:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/' | '%') unary)*
//! unary  := '-' unary | atom
//! atom   := number | '(' expr ')'
//! ```
//!
//! Whitespace, including line breaks, is ignored. All arithmetic is checked.

use std::{iter::Peekable, str::Chars};

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("Nothing to evaluate")]
    Empty,

    #[error("Unexpected end of input")]
    UnexpectedEnd,

    #[error("Unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Integer overflow")]
    Overflow,
}

/// # Errors
///
/// See [`ArithmeticError`]. Input that ends in the middle of an expression, eg:
/// `(1 +`, is [`ArithmeticError::UnexpectedEnd`].
pub fn evaluate_expression(input: &str) -> Result<i64, ArithmeticError> {
    let mut parser = Parser {
        chars: input.chars().peekable(),
    };

    if parser.peek().is_none() {
        return Err(ArithmeticError::Empty);
    }

    let value = parser.expr()?;
    match parser.peek() {
        None => Ok(value),
        Some(ch) => Err(ArithmeticError::UnexpectedChar(ch)),
    }
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
}

impl Parser<'_> {
    /// The next char that isn't whitespace, without consuming it.
    fn peek(&mut self) -> Option<char> {
        while self.chars.next_if(|ch| ch.is_whitespace()).is_some() {}
        self.chars.peek().copied()
    }

    fn expr(&mut self) -> Result<i64, ArithmeticError> {
        let mut acc = self.term()?;
        loop {
            match self.peek() {
                Some('+') => {
                    self.chars.next();
                    acc = acc.checked_add(self.term()?).ok_or(ArithmeticError::Overflow)?;
                }
                Some('-') => {
                    self.chars.next();
                    acc = acc.checked_sub(self.term()?).ok_or(ArithmeticError::Overflow)?;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn term(&mut self) -> Result<i64, ArithmeticError> {
        let mut acc = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(op @ ('*' | '/' | '%')) => op,
                _ => return Ok(acc),
            };
            self.chars.next();
            let rhs = self.unary()?;
            acc = match op {
                '*' => acc.checked_mul(rhs).ok_or(ArithmeticError::Overflow)?,
                _ if rhs == 0 => return Err(ArithmeticError::DivisionByZero),
                '/' => acc.checked_div(rhs).ok_or(ArithmeticError::Overflow)?,
                _ => acc.checked_rem(rhs).ok_or(ArithmeticError::Overflow)?,
            };
        }
    }

    fn unary(&mut self) -> Result<i64, ArithmeticError> {
        if self.peek() == Some('-') {
            self.chars.next();
            return self.unary()?.checked_neg().ok_or(ArithmeticError::Overflow);
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<i64, ArithmeticError> {
        match self.peek() {
            None => Err(ArithmeticError::UnexpectedEnd),
            Some('(') => {
                self.chars.next();
                let value = self.expr()?;
                match self.peek() {
                    Some(')') => {
                        self.chars.next();
                        Ok(value)
                    }
                    None => Err(ArithmeticError::UnexpectedEnd),
                    Some(ch) => Err(ArithmeticError::UnexpectedChar(ch)),
                }
            }
            Some(ch) if ch.is_ascii_digit() => {
                let mut acc: i64 = 0;
                while let Some(digit) = self.chars.peek().and_then(|it| it.to_digit(10)) {
                    self.chars.next();
                    acc = acc
                        .checked_mul(10)
                        .and_then(|it| it.checked_add(i64::from(digit)))
                        .ok_or(ArithmeticError::Overflow)?;
                }
                Ok(acc)
            }
            Some(ch) => Err(ArithmeticError::UnexpectedChar(ch)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("1 + 2", 3 ; "addition")]
    #[test_case("2 + 3 * 4", 14 ; "precedence")]
    #[test_case("(2 + 3) * 4", 20 ; "parens")]
    #[test_case("7 % 4 - 10 / 3", 0 ; "rem and div")]
    #[test_case("-(1 - 5)", 4 ; "unary minus")]
    #[test_case("1 +\n2 *\n3\n", 7 ; "line breaks are whitespace")]
    fn test_evaluate(input: &str, expected: i64) {
        assert_eq!(evaluate_expression(input), Ok(expected));
    }

    #[test_case("", ArithmeticError::Empty ; "empty")]
    #[test_case("(1 +", ArithmeticError::UnexpectedEnd ; "unclosed paren")]
    #[test_case("(1 + 2", ArithmeticError::UnexpectedEnd ; "missing close paren")]
    #[test_case("1 / 0", ArithmeticError::DivisionByZero ; "division by zero")]
    #[test_case("5 % (2 - 2)", ArithmeticError::DivisionByZero ; "rem by zero")]
    #[test_case("1 2", ArithmeticError::UnexpectedChar('2') ; "two numbers")]
    #[test_case("1 + x", ArithmeticError::UnexpectedChar('x') ; "unknown char")]
    #[test_case("9223372036854775807 + 1", ArithmeticError::Overflow ; "overflow")]
    fn test_evaluate_error(input: &str, expected: ArithmeticError) {
        assert_eq!(evaluate_expression(input), Err(expected));
    }
}
