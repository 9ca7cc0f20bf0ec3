// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{fmt::Display, io::Write, path::PathBuf, sync::Arc};

use futures_util::StreamExt;
use miette::IntoDiagnostic;
use tokio::{sync::{broadcast, mpsc::UnboundedReceiver},
            task::JoinHandle};

use crate::{DEBUG_REPL_MOD, EditorCore, EditorEvent, EvalRequest, EvalScheduler,
            Evaluator, ExitEvent, ExitEventQueue, History, HistoryCoalescer,
            HistorySanitizer, InputGate, InterruptNotifier, LineEditor, LineEditorHooks,
            LineEditorSink, OutputDevice, PinnedInputStream, ReplConfig, ReplEvalError,
            SafeHistory, SafeLineEditor, StdMutex, TTYResult, TerminalModeControl,
            is_fully_interactive, lock_output_device_as_mut, try_get_history_file_path,
            try_load_history, try_save_history};

/// Typed at an empty prompt, switches to [`ReplMode::Editor`].
pub const EDITOR_COMMAND: &str = ".editor";

pub const EDITOR_MODE_BANNER: &str =
    "// Entering editor mode (Ctrl+D to finish, Ctrl+C to cancel)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplMode {
    /// Each line is evaluated as soon as it is submitted, and kept for the next one if
    /// the input is incomplete.
    Normal,
    /// Lines are collected without evaluating until `Ctrl+D`.
    Editor,
}

/// The host loop. It owns every piece of the pipeline and connects them:
///
/// ```text
/// input stream --(input pump task)--> InputGate --> LineEditorSink --> LineEditor
///                                                                        |
///                 EditorEvent::{Line, Interrupted, Eof} <----------------+
///                        |
///                        v
/// AsyncRepl::run() --> EvalScheduler::eval() --> HistoryCoalescer
///        |
///        +-- print result, redisplay the prompt, InputGate::next_line()
/// ```
///
/// Lines are accumulated in a buffer. The buffer is evaluated after every line, and
/// kept while the evaluation finishes as recoverable (incomplete input). The prompt is
/// the continuation prompt while the buffer is not empty.
///
/// # Lifecycle
///
/// 1. [`Self::try_new()`] puts the terminal in raw mode (if it is interactive) and turns
///    bracketed paste on.
/// 2. [`Self::start_input_pump()`] spawns the task that feeds the gate.
/// 3. [`Self::run()`] processes editor events until an exit is requested (`Ctrl+D` on an
///    empty line, or the end of the input stream), and then saves the history.
/// 4. [Drop] turns bracketed paste off and restores the terminal mode.
#[allow(missing_debug_implementations)]
pub struct AsyncRepl<E: Evaluator> {
    pub config: ReplConfig,
    pub is_terminal: bool,
    pub gate: InputGate,
    pub safe_line_editor: SafeLineEditor,
    pub scheduler: EvalScheduler<E>,
    pub output_device: OutputDevice,
    pub safe_history: SafeHistory,
    pub maybe_history_file_path: Option<PathBuf>,
    pub buffer: String,
    pub mode: ReplMode,
    editor_event_receiver: UnboundedReceiver<EditorEvent>,
    exit_receiver: broadcast::Receiver<ExitEvent>,
    paste_disable_sequence: &'static str,
    maybe_input_pump: Option<JoinHandle<()>>,
}

impl<E: Evaluator> AsyncRepl<E>
where
    E::Value: Display,
{
    /// # Errors
    ///
    /// If the history file can't be read, raw mode can't be enabled, or bracketed paste
    /// can't be turned on.
    ///
    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock.
    pub fn try_new(
        config: ReplConfig,
        evaluator: E,
        context: E::Context,
        output_device: OutputDevice,
        mut terminal_mode: Box<dyn TerminalModeControl>,
    ) -> miette::Result<Self> {
        let is_terminal = config
            .terminal_is_interactive
            .unwrap_or_else(|| is_fully_interactive() == TTYResult::IsInteractive);

        let maybe_history_file_path = if config.persist_history {
            try_get_history_file_path()
        } else {
            None
        };
        let history = match &maybe_history_file_path {
            Some(path) => try_load_history(path, config.history_size)?,
            None => History::new(config.history_size),
        };
        let safe_history = Arc::new(StdMutex::new(history));

        let interrupt_notifier = InterruptNotifier::new();
        let exit_event_queue = ExitEventQueue::new();
        let exit_receiver = exit_event_queue.subscribe();

        let (core, editor_event_receiver) = EditorCore::new(
            output_device.clone(),
            safe_history.clone(),
            is_terminal,
            interrupt_notifier.clone(),
            exit_event_queue.clone(),
        );
        let safe_line_editor: SafeLineEditor =
            Arc::new(StdMutex::new(LineEditor::new(core)));

        if is_terminal {
            terminal_mode.set_raw_mode(true)?;
        }

        let (paste_disable_sequence, is_pasting_flag) = {
            let mut line_editor = safe_line_editor.lock().unwrap();
            let paste_disable_sequence = line_editor.install_paste_support()?;
            (paste_disable_sequence, line_editor.paste_guard.is_pasting_flag())
        };

        let gate = InputGate::new(
            Arc::new(StdMutex::new(LineEditorSink {
                safe_line_editor: safe_line_editor.clone(),
            })),
            config.block_on_newline_by_default,
        );

        let mut scheduler = EvalScheduler::new(evaluator, context)
            .with_interrupt_notifier(interrupt_notifier)
            .with_exit_event_queue(exit_event_queue)
            .with_terminal_mode(terminal_mode)
            .with_interrupt_enabled(config.interrupt_enabled)
            .with_line_editor_hooks(safe_line_editor.clone())
            .with_paste_state(is_pasting_flag)
            // Nothing can stop a running evaluation from here, so the interrupt is
            // never claimed.
            .with_on_interrupt(Box::new(|| Box::pin(async { Ok(false) })));

        scheduler.add_listener(Arc::new(StdMutex::new(HistoryCoalescer::new(
            safe_history.clone(),
            HistorySanitizer::new(config.redact_history_info),
        ))));

        Ok(Self {
            config,
            is_terminal,
            gate,
            safe_line_editor,
            scheduler,
            output_device,
            safe_history,
            maybe_history_file_path,
            buffer: String::new(),
            mode: ReplMode::Normal,
            editor_event_receiver,
            exit_receiver,
            paste_disable_sequence,
            maybe_input_pump: None,
        })
    }

    /// Spawn the task that feeds `input_stream` (raw terminal reads) into the gate.
    /// The end of the stream is forwarded to the gate too.
    pub fn start_input_pump(&mut self, mut input_stream: PinnedInputStream<Vec<u8>>) {
        let gate = self.gate.clone();
        let join_handle = tokio::spawn(async move {
            while let Some(bytes) = input_stream.next().await {
                gate.on_data(Some(&bytes));
            }
            gate.on_data(None);
        });
        self.maybe_input_pump.replace(join_handle);
    }

    /// Process editor events until an exit is requested. Saves the history on the way
    /// out.
    ///
    /// # Errors
    ///
    /// If the history file can't be written.
    pub async fn run(&mut self) -> miette::Result<()> {
        self.display_prompt();

        loop {
            tokio::select! {
                // Lines that were submitted before the exit request are handled first.
                biased;

                // This branch is cancel safe because recv is cancel safe.
                maybe_event = self.editor_event_receiver.recv() => {
                    match maybe_event {
                        Some(event) => self.handle_editor_event(event).await,
                        None => break,
                    }
                }

                // This branch is cancel safe because recv is cancel safe.
                _ = self.exit_receiver.recv() => {
                    DEBUG_REPL_MOD.then(|| {
                        tracing::debug!(message = "AsyncRepl -> exit requested");
                    });
                    break;
                }
            }
        }

        self.save_history()
    }

    async fn handle_editor_event(&mut self, event: EditorEvent) {
        // % is Display, ? is Debug.
        DEBUG_REPL_MOD.then(|| {
            tracing::debug!(message = "AsyncRepl -> editor event", event = ?event);
        });

        match event {
            EditorEvent::Line(line) => self.handle_line(&line).await,
            EditorEvent::Interrupted => {
                if self.mode == ReplMode::Editor {
                    self.mode = ReplMode::Normal;
                    self.gate.enable_block_on_newline();
                }
                self.buffer.clear();
                self.display_prompt();
            }
            EditorEvent::Eof => {
                if self.mode != ReplMode::Editor {
                    return;
                }
                self.mode = ReplMode::Normal;
                if self.buffer.trim().is_empty() {
                    self.buffer.clear();
                    self.gate.enable_block_on_newline();
                    self.display_prompt();
                } else {
                    self.evaluate_buffer().await;
                }
            }
        }
    }

    async fn handle_line(&mut self, line: &str) {
        if self.mode == ReplMode::Editor {
            self.buffer.push_str(line);
            self.buffer.push('\n');
            self.display_prompt();
            return;
        }

        if self.buffer.is_empty() {
            if line.trim() == EDITOR_COMMAND {
                self.enter_editor_mode();
                return;
            }
            if line.trim().is_empty() {
                self.display_prompt();
                return;
            }
        }

        self.buffer.push_str(line);
        self.buffer.push('\n');
        self.evaluate_buffer().await;
    }

    fn enter_editor_mode(&mut self) {
        self.mode = ReplMode::Editor;
        self.print_text(&format!("{EDITOR_MODE_BANNER}\n"));
        self.gate.disable_block_on_newline();
        self.display_prompt();
    }

    async fn evaluate_buffer(&mut self) {
        self.gate.enable_block_on_newline();

        let result = self
            .scheduler
            .eval(EvalRequest::new(self.buffer.clone()))
            .await;

        match result {
            Ok(value) => {
                self.buffer.clear();
                if let Err(report) = self.try_print_text(&format!("{value}\n")) {
                    let error = self
                        .scheduler
                        .wrap_callback_error(ReplEvalError::Callback(report));
                    tracing::error!(message = "AsyncRepl -> print failed", error = %error);
                }
            }
            // Wait for more lines.
            Err(ReplEvalError::Recoverable(_)) => {}
            Err(error) => {
                self.buffer.clear();
                self.print_text(&format!("{error}\n"));
            }
        }

        self.display_prompt();
    }

    /// Render the prompt for the current mode, and then let the gate release the input
    /// that it held back while the last line was being handled.
    ///
    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock.
    pub fn display_prompt(&mut self) {
        let prompt = match (self.mode, self.buffer.is_empty()) {
            (ReplMode::Editor, _) => String::new(),
            (ReplMode::Normal, true) => self.config.prompt.clone(),
            (ReplMode::Normal, false) => self.config.continuation_prompt.clone(),
        };

        {
            let mut line_editor = self.safe_line_editor.lock().unwrap();
            line_editor.set_prompt(prompt);
            line_editor.core.multi_line_editor_mode = self.mode == ReplMode::Editor;
            line_editor.core.display_prompt();
        } // Drop the lock, the gate pushes into the line editor.

        self.gate.next_line();
    }

    fn try_print_text(&self, text: &str) -> miette::Result<()> {
        // Raw mode doesn't turn \n into \r\n.
        let text = if self.is_terminal {
            text.replace('\n', "\r\n")
        } else {
            text.to_string()
        };
        let term = lock_output_device_as_mut!(self.output_device);
        term.write_all(text.as_bytes()).into_diagnostic()?;
        term.flush().into_diagnostic()
    }

    fn print_text(&self, text: &str) {
        if let Err(report) = self.try_print_text(text) {
            tracing::error!(message = "AsyncRepl -> print failed", error = %report);
        }
    }

    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock.
    fn save_history(&self) -> miette::Result<()> {
        let Some(path) = &self.maybe_history_file_path else {
            return Ok(());
        };
        let history = self.safe_history.lock().unwrap();
        try_save_history(path, &history)
    }
}

impl<E: Evaluator> Drop for AsyncRepl<E> {
    fn drop(&mut self) {
        if let Some(join_handle) = self.maybe_input_pump.take() {
            join_handle.abort();
        }

        if !self.paste_disable_sequence.is_empty() {
            let term = lock_output_device_as_mut!(self.output_device);
            // We don't care about the result of this operation.
            term.write_all(self.paste_disable_sequence.as_bytes()).ok();
            term.flush().ok();
        }

        if self.is_terminal {
            // We don't care about the result of this operation.
            self.scheduler.terminal_mode.set_raw_mode(false).ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{ArithmeticEvaluator, NoopTerminalMode,
                test_fixtures::{MockTerminalMode, OutputDeviceExt, StdoutMock,
                                gen_input_stream, gen_input_stream_with_delay}};
    use pretty_assertions::assert_eq;

    fn piped_config() -> ReplConfig {
        ReplConfig {
            terminal_is_interactive: Some(false),
            ..Default::default()
        }
    }

    fn new_repl(config: ReplConfig) -> (AsyncRepl<ArithmeticEvaluator>, StdoutMock) {
        let (output_device, stdout_mock) = OutputDevice::new_mock();
        let repl = AsyncRepl::try_new(
            config,
            ArithmeticEvaluator,
            (),
            output_device,
            Box::new(NoopTerminalMode),
        )
        .unwrap();
        (repl, stdout_mock)
    }

    fn chunks(items: &[&str]) -> Vec<Vec<u8>> {
        items.iter().map(|it| it.as_bytes().to_vec()).collect()
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_lines_in_one_chunk_are_evaluated_in_order() {
        let (mut repl, stdout_mock) = new_repl(piped_config());
        repl.start_input_pump(gen_input_stream(chunks(&["1 + 2\n3 * 4\n\n7 % 4"])));
        repl.run().await.unwrap();

        assert_eq!(stdout_mock.get_copy_of_buffer_as_string(), "3\n12\n3\n");
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_multi_line_input_is_one_history_entry() {
        let (mut repl, stdout_mock) = new_repl(piped_config());
        repl.start_input_pump(gen_input_stream(chunks(&["(1 +\n", "2)\n", "5 - 1\n"])));
        repl.run().await.unwrap();

        assert_eq!(stdout_mock.get_copy_of_buffer_as_string(), "3\n4\n");
        let entries: Vec<String> = repl
            .safe_history
            .lock()
            .unwrap()
            .entries
            .iter()
            .cloned()
            .collect();
        assert_eq!(entries, vec!["5 - 1".to_string(), "(1 + 2)".to_string()]);
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_crlf_split_across_reads_does_not_stall_input() {
        let (mut repl, stdout_mock) = new_repl(piped_config());
        repl.start_input_pump(gen_input_stream_with_delay(
            chunks(&["1 + 1\r", "\n2 + 2\r\n"]),
            Duration::from_millis(20),
        ));

        let result = tokio::time::timeout(Duration::from_secs(5), repl.run()).await;
        assert!(result.is_ok(), "run() did not finish");
        result.unwrap().unwrap();

        assert_eq!(stdout_mock.get_copy_of_buffer_as_string(), "2\n4\n");
        assert_eq!(repl.gate.queued_token_count(), 0);
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_evaluation_error_is_printed_and_buffer_cleared() {
        let (mut repl, stdout_mock) = new_repl(piped_config());
        repl.start_input_pump(gen_input_stream(chunks(&["1 / 0\n2 + 2\n"])));
        repl.run().await.unwrap();

        let output = stdout_mock.get_copy_of_buffer_as_string();
        assert!(output.contains("Division by zero"));
        assert!(output.ends_with("4\n"));
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_interrupt_cancels_pending_evaluation() {
        let (output_device, stdout_mock) = OutputDevice::new_mock();
        let (terminal_mode, transitions) = MockTerminalMode::new(false);
        let mut repl = AsyncRepl::try_new(
            piped_config(),
            ArithmeticEvaluator,
            (),
            output_device,
            Box::new(terminal_mode),
        )
        .unwrap();

        repl.start_input_pump(gen_input_stream_with_delay(
            chunks(&["sleep 60000\n", "\x03", "1 + 1\n"]),
            Duration::from_millis(20),
        ));
        repl.run().await.unwrap();

        let output = stdout_mock.get_copy_of_buffer_as_string();
        assert!(output.contains(&ReplEvalError::Interrupted.to_string()));
        assert!(output.ends_with("2\n"));
        // Each evaluation turns raw mode off, and then back to what it was: once for the
        // interrupted `sleep` and once for `1 + 1`.
        assert_eq!(
            *transitions.lock().unwrap(),
            vec![false, false, false, false]
        );
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_editor_mode_evaluates_on_ctrl_d() {
        let (mut repl, stdout_mock) = new_repl(piped_config());
        repl.start_input_pump(gen_input_stream_with_delay(
            chunks(&[".editor\n", "1 +\n", "2 *\n", "3\n", "\x04", "4 + 4\n"]),
            Duration::from_millis(20),
        ));
        repl.run().await.unwrap();

        assert_eq!(
            stdout_mock.get_copy_of_buffer_as_string(),
            format!("{EDITOR_MODE_BANNER}\n7\n8\n")
        );
        assert_eq!(repl.mode, ReplMode::Normal);
        assert!(repl.gate.is_block_on_newline_enabled());
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_editor_mode_cancelled_by_ctrl_c() {
        let (mut repl, stdout_mock) = new_repl(piped_config());
        repl.start_input_pump(gen_input_stream_with_delay(
            chunks(&[".editor\n", "1 +\n", "\x03", "2 + 2\n"]),
            Duration::from_millis(20),
        ));
        repl.run().await.unwrap();

        assert_eq!(
            stdout_mock.get_copy_of_buffer_as_string(),
            format!("{EDITOR_MODE_BANNER}\n4\n")
        );
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_ctrl_d_on_empty_line_exits() {
        let (mut repl, stdout_mock) = new_repl(piped_config());
        repl.start_input_pump(gen_input_stream_with_delay(
            chunks(&["1 + 1\n", "\x04", "2 + 2\n"]),
            Duration::from_millis(20),
        ));
        repl.run().await.unwrap();

        assert_eq!(stdout_mock.get_copy_of_buffer_as_string(), "2\n");
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_history_saved_on_exit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history");

        let (mut repl, _stdout_mock) = new_repl(piped_config());
        repl.maybe_history_file_path = Some(path.clone());
        repl.start_input_pump(gen_input_stream(chunks(&["1 + 1\n2 + 2\n"])));
        repl.run().await.unwrap();

        let saved = try_load_history(&path, 10).unwrap();
        assert_eq!(saved.entries, vec!["2 + 2".to_string(), "1 + 1".to_string()]);
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_terminal_renders_prompt_and_uses_crlf() {
        let config = ReplConfig {
            terminal_is_interactive: Some(true),
            ..Default::default()
        };
        let (output_device, stdout_mock) = OutputDevice::new_mock();
        let (terminal_mode, transitions) = MockTerminalMode::new(false);
        let mut repl = AsyncRepl::try_new(
            config,
            ArithmeticEvaluator,
            (),
            output_device,
            Box::new(terminal_mode),
        )
        .unwrap();
        repl.start_input_pump(gen_input_stream(chunks(&["6 * 7\r"])));
        repl.run().await.unwrap();
        drop(repl);

        let output = stdout_mock.get_copy_of_buffer_as_string_strip_ansi();
        assert!(output.contains("> 6 * 7"));
        assert!(stdout_mock.get_copy_of_buffer_as_string().contains("42\r\n"));
        // On at startup, off and on around the evaluation, off on drop.
        assert_eq!(*transitions.lock().unwrap(), vec![true, false, true, false]);
    }
}
