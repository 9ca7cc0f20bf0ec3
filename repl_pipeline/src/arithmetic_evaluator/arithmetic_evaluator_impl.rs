// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{fmt::{Display, Formatter},
          time::Duration};

use miette::miette;

use crate::{EvalValue, Evaluator, evaluate_expression};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticValue {
    Number(i64),
    /// Result of `sleep <ms>`.
    Slept(u64),
}

impl Display for ArithmeticValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ArithmeticValue::Number(number) => write!(f, "{number}"),
            ArithmeticValue::Slept(millis) => write!(f, "slept {millis}ms"),
        }
    }
}

/// The [`Evaluator`] behind the `repl_demo` binary.
///
/// | Input          | Result                                           |
/// |----------------|--------------------------------------------------|
/// | `sleep <ms>`   | resolves after `ms` milliseconds, interruptible  |
/// | `fail <msg>`   | an error with `msg`                              |
/// | anything else  | integer arithmetic, see [`evaluate_expression()`] |
#[derive(Debug, Default, Clone, Copy)]
pub struct ArithmeticEvaluator;

impl Evaluator for ArithmeticEvaluator {
    type Context = ();
    type Value = ArithmeticValue;

    fn evaluate(
        &mut self,
        input: &str,
        _context: &mut Self::Context,
        _source_name: &str,
    ) -> EvalValue<Self::Value> {
        let input = input.trim();

        if let Some(millis) = input.strip_prefix("sleep ") {
            let millis: u64 = match millis.trim().parse() {
                Ok(millis) => millis,
                Err(error) => {
                    return EvalValue::Ready(Err(miette!(
                        "Invalid sleep duration '{}': {error}",
                        millis.trim()
                    )));
                }
            };
            return EvalValue::Pending(Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(millis)).await;
                Ok(ArithmeticValue::Slept(millis))
            }));
        }

        if let Some(message) = input.strip_prefix("fail ") {
            return EvalValue::Ready(Err(miette!("{}", message.trim())));
        }

        EvalValue::Ready(
            evaluate_expression(input)
                .map(ArithmeticValue::Number)
                .map_err(miette::Report::new),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn evaluate(input: &str) -> EvalValue<ArithmeticValue> {
        ArithmeticEvaluator.evaluate(input, &mut (), "test")
    }

    #[test]
    fn test_expression_is_ready() {
        let EvalValue::Ready(result) = evaluate("(1 + 2) * 3\n") else {
            panic!("expected a ready value");
        };
        assert_eq!(result.unwrap(), ArithmeticValue::Number(9));
    }

    #[test]
    fn test_fail_command() {
        let EvalValue::Ready(result) = evaluate("fail nope") else {
            panic!("expected a ready value");
        };
        assert_eq!(result.unwrap_err().to_string(), "nope");
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_sleep_is_pending() {
        let EvalValue::Pending(future) = evaluate("sleep 5") else {
            panic!("expected a pending value");
        };
        let value = future.await.unwrap();
        assert_eq!(value, ArithmeticValue::Slept(5));
        assert_eq!(value.to_string(), "slept 5ms");
    }

    #[test]
    fn test_bad_sleep_duration() {
        let EvalValue::Ready(result) = evaluate("sleep soon") else {
            panic!("expected a ready value");
        };
        assert!(result.unwrap_err().to_string().contains("soon"));
    }
}
