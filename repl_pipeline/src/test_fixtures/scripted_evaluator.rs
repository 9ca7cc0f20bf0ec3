// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::time::Duration;

use miette::miette;

use crate::{EvalEvent, EvalEventListener, EvalValue, Evaluator};

/// Understands three commands:
/// - `ok <value>`: ready with `value`.
/// - `fail <message>`: ready with an error.
/// - `sleep <ms>`: pending, resolves to `slept <ms>ms`.
///
/// A probe set with [`Self::set_probe()`] runs at the start of every evaluation, so a
/// test can look at (or change) shared state while the evaluation is in flight.
#[derive(Default)]
#[allow(missing_debug_implementations)]
pub struct ScriptedEvaluator {
    pub inputs: Vec<String>,
    maybe_probe: Option<Box<dyn FnMut() + Send>>,
}

impl ScriptedEvaluator {
    pub fn set_probe(&mut self, probe: impl FnMut() + Send + 'static) {
        self.maybe_probe = Some(Box::new(probe));
    }
}

impl Evaluator for ScriptedEvaluator {
    type Context = ();
    type Value = String;

    fn evaluate(
        &mut self,
        input: &str,
        _context: &mut Self::Context,
        _source_name: &str,
    ) -> EvalValue<Self::Value> {
        if let Some(probe) = self.maybe_probe.as_mut() {
            probe();
        }
        self.inputs.push(input.to_string());

        if let Some(value) = input.strip_prefix("ok ") {
            return EvalValue::Ready(Ok(value.trim().to_string()));
        }

        if let Some(message) = input.strip_prefix("fail ") {
            return EvalValue::Ready(Err(miette!("{}", message.trim())));
        }

        if let Some(millis) = input.strip_prefix("sleep ") {
            let millis: u64 = millis.trim().parse().unwrap_or_default();
            return EvalValue::Pending(Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(millis)).await;
                Ok(format!("slept {millis}ms"))
            }));
        }

        EvalValue::Ready(Err(miette!("unknown command: {input}")))
    }
}

/// Remembers every event. Fails every call with `fail_with`, if set.
#[derive(Debug, Default)]
pub struct RecordingEvalListener {
    pub events: Vec<EvalEvent>,
    pub fail_with: Option<String>,
}

impl EvalEventListener for RecordingEvalListener {
    fn on_eval_event(&mut self, event: &EvalEvent) -> miette::Result<()> {
        self.events.push(event.clone());
        match &self.fail_with {
            Some(message) => Err(miette!("{message}")),
            None => Ok(()),
        }
    }
}
