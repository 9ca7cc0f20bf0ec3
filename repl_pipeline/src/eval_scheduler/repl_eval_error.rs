// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use thiserror::Error;

use crate::EvalErrorKind;

/// Every way an evaluation can fail, as seen by the caller of
/// [`crate::EvalScheduler::eval()`].
#[derive(Debug, Error)]
pub enum ReplEvalError {
    /// The input is incomplete. The caller should keep the buffer and ask for more.
    #[error("{0}")]
    Recoverable(miette::Report),

    /// The evaluator itself failed.
    #[error("{0}")]
    Evaluation(miette::Report),

    /// The interrupt signal won the race against a pending evaluation. Always fatal.
    #[error("Asynchronous execution was interrupted by `SIGINT`")]
    Interrupted,

    /// An event listener (or any other bookkeeping callback) failed.
    #[error("{0}")]
    Callback(miette::Report),
}

impl ReplEvalError {
    #[must_use]
    pub fn kind(&self) -> EvalErrorKind {
        match self {
            ReplEvalError::Recoverable(_) => EvalErrorKind::Recoverable,
            ReplEvalError::Evaluation(_) => EvalErrorKind::Evaluation,
            ReplEvalError::Interrupted => EvalErrorKind::Interrupted,
            ReplEvalError::Callback(_) => EvalErrorKind::Callback,
        }
    }

    #[must_use]
    pub fn is_recoverable(&self) -> bool { matches!(self, ReplEvalError::Recoverable(_)) }
}
