// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use strum_macros::{AsRefStr, Display};

use crate::StdMutex;

/// Used as [`EvalRequest::source_name`] for lines typed at the prompt.
pub const DEFAULT_SOURCE_NAME: &str = "REPL";

/// One submitted input buffer. It may contain several lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalRequest {
    pub input: String,
    pub source_name: String,
}

impl EvalRequest {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            source_name: DEFAULT_SOURCE_NAME.to_string(),
        }
    }
}

/// What an [`Evaluator`] hands back. A [`EvalValue::Ready`] result can't be interrupted,
/// a [`EvalValue::Pending`] one is raced against the interrupt signal.
#[allow(missing_debug_implementations)]
pub enum EvalValue<V> {
    Ready(miette::Result<V>),
    Pending(BoxFuture<'static, miette::Result<V>>),
}

/// The thing that actually runs user input. The scheduler treats the context as opaque,
/// it is only passed through.
pub trait Evaluator: Send {
    type Context: Send;
    type Value: Send + 'static;

    fn evaluate(
        &mut self,
        input: &str,
        context: &mut Self::Context,
        source_name: &str,
    ) -> EvalValue<Self::Value>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display)]
pub enum EvalErrorKind {
    #[strum(to_string = "recoverable")]
    Recoverable,
    #[strum(to_string = "evaluation")]
    Evaluation,
    #[strum(to_string = "interrupted")]
    Interrupted,
    #[strum(to_string = "callback")]
    Callback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalFinishOutcome {
    Success,
    Failure {
        kind: EvalErrorKind,
        recoverable: bool,
        message: String,
    },
}

impl EvalFinishOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool { matches!(self, EvalFinishOutcome::Success) }

    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EvalFinishOutcome::Failure {
                recoverable: true,
                ..
            }
        )
    }
}

/// Emitted by the [`crate::EvalScheduler`] around every evaluation. For each
/// [`EvalEvent::Start`] there is exactly one [`EvalEvent::Finish`], emitted after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalEvent {
    Start {
        input: String,
    },
    Finish {
        input: String,
        outcome: EvalFinishOutcome,
    },
}

impl EvalEvent {
    #[must_use]
    pub fn input(&self) -> &str {
        match self {
            EvalEvent::Start { input } | EvalEvent::Finish { input, .. } => input,
        }
    }
}

/// Listeners are called synchronously, in the order they were added, on the task that
/// runs the evaluation.
pub trait EvalEventListener: Send {
    /// # Errors
    ///
    /// A returned error is handed to the scheduler's callback error wrapper. It does not
    /// stop the remaining listeners from being called.
    fn on_eval_event(&mut self, event: &EvalEvent) -> miette::Result<()>;
}

pub type SafeEvalEventListener = Arc<StdMutex<dyn EvalEventListener>>;
