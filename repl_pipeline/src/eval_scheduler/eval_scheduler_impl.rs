// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use futures_util::future::BoxFuture;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::Instrument;

use crate::{CHANNEL_CAPACITY, DEBUG_EVAL_SCHEDULER_MOD, EvalEvent, EvalFinishOutcome,
            EvalRequest, EvalValue, Evaluator, ExitEventQueue, InterruptNotifier,
            NoopTerminalMode, ReplEvalError, SafeBool, SafeEvalEventListener,
            SafeLineEditorHooks, TerminalModeControl, is_incomplete_input};

/// Decides, given the input that failed, whether the failure is recoverable.
pub type RecoverablePredicate = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Called when the interrupt signal fires during a pending evaluation. Resolving to
/// `true` means the interrupt was handled and the evaluation should keep running.
pub type OnInterrupt = Box<dyn Fn() -> BoxFuture<'static, miette::Result<bool>> + Send + Sync>;

/// Applied to [`ReplEvalError::Callback`] errors before they are returned.
pub type WrapCallbackError = Box<dyn Fn(ReplEvalError) -> ReplEvalError + Send + Sync>;

pub const RECOVERABLE_WHILE_PASTING: &str = "recoverable because pasting in progress";

/// Wraps one [`Evaluator`] and runs it for each submitted buffer, doing all the
/// bookkeeping around it.
///
/// # Evaluation sequence
///
/// ```text
/// eval(request)
///   |-- pasting? -----------------------------------> Err(Recoverable), nothing else
///   |-- raw mode off (only if interrupts are armed)
///   |-- emit EvalEvent::Start
///   |-- blank the prompt, hold exit requests
///   |-- evaluator.evaluate()
///   |     Ready   -> result
///   |     Pending -> tokio::select! { future, interrupt -> on_interrupt() }
///   |-- restore raw mode, restore the prompt (if it is still blank)
///   |-- classify the error (Interrupted is always fatal)
///   |-- emit EvalEvent::Finish
///   |-- deliver a held exit request
///   `-- return the result
/// ```
///
/// Every step after the evaluator call always runs, even if an event listener fails.
///
/// # Single flight
///
/// [`Self::eval()`] takes `&mut self`, so at most one evaluation is in flight per
/// scheduler. The caller is expected to wait for the result before submitting again;
/// the [`crate::InputGate`] holds the input that arrives in the meantime.
#[allow(missing_debug_implementations)]
pub struct EvalScheduler<E: Evaluator> {
    pub evaluator: E,
    pub context: E::Context,
    pub interrupt_notifier: InterruptNotifier,
    pub exit_event_queue: ExitEventQueue,
    pub terminal_mode: Box<dyn TerminalModeControl>,
    pub listeners: Vec<SafeEvalEventListener>,
    pub event_sender: broadcast::Sender<EvalEvent>,
    pub interrupt_enabled: bool,
    maybe_line_editor_hooks: Option<SafeLineEditorHooks>,
    maybe_is_pasting: Option<SafeBool>,
    maybe_on_interrupt: Option<OnInterrupt>,
    is_recoverable_error: RecoverablePredicate,
    wrap_callback_error: WrapCallbackError,
}

impl<E: Evaluator> EvalScheduler<E> {
    pub fn new(evaluator: E, context: E::Context) -> Self {
        let (event_sender, _) = broadcast::channel::<EvalEvent>(CHANNEL_CAPACITY);
        Self {
            evaluator,
            context,
            interrupt_notifier: InterruptNotifier::new(),
            exit_event_queue: ExitEventQueue::new(),
            terminal_mode: Box::new(NoopTerminalMode),
            listeners: vec![],
            event_sender,
            interrupt_enabled: true,
            maybe_line_editor_hooks: None,
            maybe_is_pasting: None,
            maybe_on_interrupt: None,
            is_recoverable_error: Box::new(is_incomplete_input),
            wrap_callback_error: Box::new(|error| error),
        }
    }

    #[must_use]
    pub fn with_interrupt_notifier(mut self, interrupt_notifier: InterruptNotifier) -> Self {
        self.interrupt_notifier = interrupt_notifier;
        self
    }

    #[must_use]
    pub fn with_exit_event_queue(mut self, exit_event_queue: ExitEventQueue) -> Self {
        self.exit_event_queue = exit_event_queue;
        self
    }

    #[must_use]
    pub fn with_terminal_mode(
        mut self,
        terminal_mode: Box<dyn TerminalModeControl>,
    ) -> Self {
        self.terminal_mode = terminal_mode;
        self
    }

    #[must_use]
    pub fn with_interrupt_enabled(mut self, interrupt_enabled: bool) -> Self {
        self.interrupt_enabled = interrupt_enabled;
        self
    }

    /// The prompt is blanked while an evaluation runs.
    #[must_use]
    pub fn with_line_editor_hooks(mut self, hooks: SafeLineEditorHooks) -> Self {
        self.maybe_line_editor_hooks = Some(hooks);
        self
    }

    /// See [`crate::PasteGuard::is_pasting_flag()`].
    #[must_use]
    pub fn with_paste_state(mut self, is_pasting: SafeBool) -> Self {
        self.maybe_is_pasting = Some(is_pasting);
        self
    }

    /// Interrupts are only raced against a pending evaluation if this is set.
    #[must_use]
    pub fn with_on_interrupt(mut self, on_interrupt: OnInterrupt) -> Self {
        self.maybe_on_interrupt = Some(on_interrupt);
        self
    }

    /// Replaces the default [`is_incomplete_input()`] predicate.
    #[must_use]
    pub fn with_recoverable_predicate(mut self, predicate: RecoverablePredicate) -> Self {
        self.is_recoverable_error = predicate;
        self
    }

    #[must_use]
    pub fn with_wrap_callback_error(mut self, wrap: WrapCallbackError) -> Self {
        self.wrap_callback_error = wrap;
        self
    }

    pub fn add_listener(&mut self, listener: SafeEvalEventListener) {
        self.listeners.push(listener);
    }

    /// A receiver that sees every [`EvalEvent`] after the synchronous listeners did.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EvalEvent> {
        self.event_sender.subscribe()
    }

    /// Apply the callback error wrapper to an error raised outside of [`Self::eval()`],
    /// eg: while printing a result.
    #[must_use]
    pub fn wrap_callback_error(&self, error: ReplEvalError) -> ReplEvalError {
        (self.wrap_callback_error)(error)
    }

    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock.
    #[must_use]
    pub fn is_pasting(&self) -> bool {
        self.maybe_is_pasting
            .as_ref()
            .is_some_and(|it| *it.lock().unwrap())
    }

    /// Interrupts are armed if enabled and there is a handler to call.
    #[must_use]
    pub fn is_interrupt_armed(&self) -> bool {
        self.interrupt_enabled && self.maybe_on_interrupt.is_some()
    }

    /// Run one evaluation. See the type level docs for the full sequence.
    ///
    /// # Errors
    ///
    /// - [`ReplEvalError::Recoverable`] if a paste is in progress, or the evaluator
    ///   failed and the input is incomplete.
    /// - [`ReplEvalError::Evaluation`] if the evaluator failed otherwise.
    /// - [`ReplEvalError::Interrupted`] if the interrupt signal won the race.
    /// - [`ReplEvalError::Callback`] (after the wrapper) if an event listener failed.
    pub async fn eval(&mut self, request: EvalRequest) -> Result<E::Value, ReplEvalError> {
        if self.is_pasting() {
            DEBUG_EVAL_SCHEDULER_MOD.then(|| {
                tracing::debug!(message = "EvalScheduler -> pasting, not evaluating");
            });
            return Err(ReplEvalError::Recoverable(miette::Report::msg(
                RECOVERABLE_WHILE_PASTING,
            )));
        }

        let span = tracing::info_span!(
            "eval",
            source_name = %request.source_name,
            input_len = request.input.len()
        );
        self.run_eval(request).instrument(span).await
    }

    async fn run_eval(&mut self, request: EvalRequest) -> Result<E::Value, ReplEvalError> {
        let EvalRequest { input, source_name } = request;
        let interrupt_armed = self.is_interrupt_armed();

        // Raw mode off, so Ctrl+C becomes SIGINT while waiting.
        let maybe_saved_raw_mode = if interrupt_armed {
            self.set_raw_mode_logged(false)
        } else {
            None
        };

        let mut maybe_callback_error = self
            .emit(&EvalEvent::Start {
                input: input.clone(),
            })
            .err();

        let maybe_saved_prompt = self.blank_prompt();
        self.exit_event_queue.begin_deferral();

        // Subscribe before calling the evaluator, so an interrupt that arrives while it
        // is starting up is not lost.
        let maybe_interrupt_receiver =
            interrupt_armed.then(|| self.interrupt_notifier.subscribe());

        let result = match self
            .evaluator
            .evaluate(&input, &mut self.context, &source_name)
        {
            EvalValue::Ready(result) => result.map_err(ReplEvalError::Evaluation),
            EvalValue::Pending(future) => {
                race_against_interrupt(
                    future,
                    maybe_interrupt_receiver,
                    self.maybe_on_interrupt.as_ref(),
                )
                .await
            }
        };

        if let Some(saved_raw_mode) = maybe_saved_raw_mode {
            self.set_raw_mode_logged(saved_raw_mode);
        }
        self.restore_prompt(maybe_saved_prompt);
        let exit_pending = self.exit_event_queue.end_deferral();

        let result = self.classify(&input, result);

        let outcome = match &result {
            Ok(_) => EvalFinishOutcome::Success,
            Err(error) => EvalFinishOutcome::Failure {
                kind: error.kind(),
                recoverable: error.is_recoverable(),
                message: error.to_string(),
            },
        };
        let finish_result = self.emit(&EvalEvent::Finish {
            input: input.clone(),
            outcome,
        });
        if let Err(error) = finish_result {
            maybe_callback_error.get_or_insert(error);
        }

        if exit_pending {
            DEBUG_EVAL_SCHEDULER_MOD.then(|| {
                tracing::debug!(message = "EvalScheduler -> delivering deferred exit");
            });
            self.exit_event_queue.deliver();
        }

        // % is Display, ? is Debug.
        DEBUG_EVAL_SCHEDULER_MOD.then(|| {
            tracing::debug!(
                message = "EvalScheduler -> eval done",
                input = ?input,
                is_ok = result.is_ok()
            );
        });

        match maybe_callback_error {
            Some(report) => Err(self.wrap_callback_error(ReplEvalError::Callback(report))),
            None => result,
        }
    }

    fn classify(
        &self,
        input: &str,
        result: Result<E::Value, ReplEvalError>,
    ) -> Result<E::Value, ReplEvalError> {
        match result {
            Err(ReplEvalError::Evaluation(report)) if (self.is_recoverable_error)(input) => {
                Err(ReplEvalError::Recoverable(report))
            }
            other => other,
        }
    }

    /// Calls every listener even if an earlier one fails. Returns the first failure.
    ///
    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock.
    fn emit(&self, event: &EvalEvent) -> miette::Result<()> {
        let mut maybe_first_error = None;

        for listener in &self.listeners {
            let mut listener = listener.lock().unwrap();
            if let Err(report) = listener.on_eval_event(event) {
                tracing::error!(
                    message = "EvalScheduler -> listener failed",
                    error = %report
                );
                maybe_first_error.get_or_insert(report);
            }
        }

        // No receivers is fine.
        self.event_sender.send(event.clone()).ok();

        match maybe_first_error {
            Some(report) => Err(report),
            None => Ok(()),
        }
    }

    /// Returns the previous mode, or [None] if it could not be changed.
    fn set_raw_mode_logged(&mut self, enabled: bool) -> Option<bool> {
        match self.terminal_mode.set_raw_mode(enabled) {
            Ok(previous) => Some(previous),
            Err(report) => {
                tracing::error!(
                    message = "EvalScheduler -> could not set raw mode",
                    enabled = enabled,
                    error = %report
                );
                None
            }
        }
    }

    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock.
    fn blank_prompt(&self) -> Option<String> {
        let hooks = self.maybe_line_editor_hooks.as_ref()?;
        let mut hooks = hooks.lock().unwrap();
        let saved = hooks.prompt();
        hooks.set_prompt(String::new());
        Some(saved)
    }

    /// Someone else may have set a new prompt during the evaluation, that one wins.
    ///
    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock.
    fn restore_prompt(&self, maybe_saved_prompt: Option<String>) {
        let (Some(hooks), Some(saved_prompt)) =
            (self.maybe_line_editor_hooks.as_ref(), maybe_saved_prompt)
        else {
            return;
        };
        let mut hooks = hooks.lock().unwrap();
        if hooks.prompt().is_empty() {
            hooks.set_prompt(saved_prompt);
        }
    }
}

/// Wait for `future`, unless the interrupt fires first and the interrupt handler
/// does not claim it. The interrupt is one shot: once it has fired, a second one
/// during the same evaluation is ignored.
async fn race_against_interrupt<V>(
    mut future: BoxFuture<'static, miette::Result<V>>,
    maybe_interrupt_receiver: Option<broadcast::Receiver<()>>,
    maybe_on_interrupt: Option<&OnInterrupt>,
) -> Result<V, ReplEvalError> {
    let Some(mut interrupt_receiver) = maybe_interrupt_receiver else {
        return future.await.map_err(ReplEvalError::Evaluation);
    };

    let mut listening_for_interrupt = true;
    let mut handler_future: BoxFuture<'static, bool> =
        Box::pin(std::future::pending());

    loop {
        tokio::select! {
            // This branch is cancel safe because the future is polled by reference
            // and is not dropped if another branch completes first.
            result = &mut future => {
                return result.map_err(ReplEvalError::Evaluation);
            }

            // This branch is cancel safe because recv is cancel safe.
            signal = interrupt_receiver.recv(), if listening_for_interrupt => {
                listening_for_interrupt = false;
                match signal {
                    Ok(()) | Err(RecvError::Lagged(_)) => {
                        DEBUG_EVAL_SCHEDULER_MOD.then(|| {
                            tracing::debug!(message = "EvalScheduler -> interrupt");
                        });
                        handler_future = call_on_interrupt(maybe_on_interrupt);
                    }
                    // Nobody can interrupt any more.
                    Err(RecvError::Closed) => {}
                }
            }

            // This branch is cancel safe because the future is polled by reference.
            handled = &mut handler_future => {
                if !handled {
                    return Err(ReplEvalError::Interrupted);
                }
                handler_future = Box::pin(std::future::pending());
            }
        }
    }
}

fn call_on_interrupt(maybe_on_interrupt: Option<&OnInterrupt>) -> BoxFuture<'static, bool> {
    let Some(on_interrupt) = maybe_on_interrupt else {
        return Box::pin(async { false });
    };
    let future = on_interrupt();
    Box::pin(async move {
        match future.await {
            Ok(handled) => handled,
            Err(report) => {
                tracing::warn!(
                    message = "EvalScheduler -> interrupt handler failed",
                    error = %report
                );
                false
            }
        }
    })
}
