// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::Arc;

use crate::{EditorCore, Keypress, StdMutex};

/// Receives every [`Keypress`] the line editor decodes, except the bracketed paste
/// markers which are consumed by the [`crate::PasteGuard`].
pub trait KeyHandler: Send {
    fn handle_key(&mut self, key: &Keypress, editor: &mut EditorCore);

    /// Only [`crate::PasteFilter`] returns `true`. Used to detect an attempt to wrap the
    /// handler twice.
    fn is_paste_filter(&self) -> bool { false }
}

pub type SafeKeyHandler = Arc<StdMutex<dyn KeyHandler>>;

/// The small surface of the line editor that the [`crate::PasteGuard`] and the
/// [`crate::EvalScheduler`] need. Neither of them owns the editor.
pub trait LineEditorHooks: Send {
    fn key_handler(&self) -> SafeKeyHandler;

    fn set_key_handler(&mut self, key_handler: SafeKeyHandler);

    fn prompt(&self) -> String;

    /// Only stores the prompt, it is displayed the next time the line is rendered.
    fn set_prompt(&mut self, prompt: String);

    /// Whether the output side is an interactive terminal.
    fn is_terminal(&self) -> bool;
}

pub type SafeLineEditorHooks = Arc<StdMutex<dyn LineEditorHooks>>;
