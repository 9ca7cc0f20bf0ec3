// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::Arc;

use crate::{EditorCore, GateChunk, GateSink, KeyName, Keypress, KeypressParser,
            LineEditorHooks, PasteGuard, PasteGuardError, SafeKeyHandler, StdMutex,
            lock_output_device_as_mut};

/// Owns the line being edited and turns the characters that the [`crate::InputGate`]
/// forwards into edits.
///
/// ```text
/// GateChunk::Data -> KeypressParser -> paste-start / paste-end -> PasteGuard
///                                   -> any other key           -> current KeyHandler
/// GateChunk::End  -> EditorCore::on_end_of_stream()
/// ```
///
/// The current key handler is an [`crate::EmacsKeyHandler`], or a
/// [`crate::PasteFilter`] wrapping it while a paste is in progress.
#[allow(missing_debug_implementations)]
pub struct LineEditor {
    pub core: EditorCore,
    pub parser: KeypressParser,
    pub paste_guard: PasteGuard,
}

pub type SafeLineEditor = Arc<StdMutex<LineEditor>>;

impl LineEditor {
    #[must_use]
    pub fn new(core: EditorCore) -> Self {
        Self {
            core,
            parser: KeypressParser::new(),
            paste_guard: PasteGuard::new(),
        }
    }

    /// Turn bracketed paste on for the output device, reading `TERM` from the
    /// environment. Returns the sequence to write on shutdown (empty if nothing was
    /// turned on).
    pub fn install_paste_support(&mut self) -> miette::Result<&'static str> {
        let maybe_term = std::env::var("TERM").ok();
        self.install_paste_support_with_term(maybe_term.as_deref())
    }

    pub fn install_paste_support_with_term(
        &mut self,
        maybe_term: Option<&str>,
    ) -> miette::Result<&'static str> {
        let Self {
            core, paste_guard, ..
        } = self;
        let output_device = core.output_device.clone();
        let term = lock_output_device_as_mut!(output_device);
        paste_guard.install_with_term(core, term, maybe_term)
    }

    /// Every key in `chunk` is handled, even after one of them failed.
    ///
    /// # Errors
    ///
    /// The first [`PasteGuardError`] in the chunk, eg: a paste start marker while a
    /// paste is already open. The paste that is already open stays in effect.
    pub fn feed(&mut self, chunk: GateChunk) -> Result<(), PasteGuardError> {
        let mut maybe_error = None;
        match chunk {
            GateChunk::End => self.core.on_end_of_stream(),
            GateChunk::Data(text) => {
                for key in self.parser.parse(&text) {
                    if let Err(error) = self.dispatch(&key) {
                        maybe_error.get_or_insert(error);
                    }
                }
            }
        }
        match maybe_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock.
    fn dispatch(&mut self, key: &Keypress) -> Result<(), PasteGuardError> {
        if key.is(KeyName::PasteStart) {
            return self.paste_guard.on_paste_start(&mut self.core);
        }

        if key.is(KeyName::PasteEnd) {
            self.paste_guard.on_paste_end(&mut self.core);
            return Ok(());
        }

        let key_handler = self.core.key_handler();
        key_handler.lock().unwrap().handle_key(key, &mut self.core);
        Ok(())
    }
}

impl LineEditorHooks for LineEditor {
    fn key_handler(&self) -> SafeKeyHandler { self.core.key_handler() }

    fn set_key_handler(&mut self, key_handler: SafeKeyHandler) {
        self.core.set_key_handler(key_handler);
    }

    fn prompt(&self) -> String { self.core.prompt() }

    fn set_prompt(&mut self, prompt: String) { self.core.set_prompt(prompt); }

    fn is_terminal(&self) -> bool { self.core.is_terminal() }
}

/// What the [`crate::InputGate`] pushes into. Never paused: the gate's own line ending
/// blocking is what holds input back while an evaluation runs.
///
/// [`crate::GateSink::push`] can't return an error to the gate, so a
/// [`PasteGuardError`] from [`LineEditor::feed()`] ends here, logged at error level.
#[allow(missing_debug_implementations)]
pub struct LineEditorSink {
    pub safe_line_editor: SafeLineEditor,
}

impl GateSink for LineEditorSink {
    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock.
    fn push(&mut self, chunk: GateChunk) {
        if let Err(error) = self.safe_line_editor.lock().unwrap().feed(chunk) {
            // % is Display, ? is Debug.
            tracing::error!(message = "LineEditorSink -> feed", error = %error);
        }
    }

    fn is_paused(&self) -> bool { false }
}
