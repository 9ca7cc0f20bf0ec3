// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::{EditorCore, EditorEvent, ExitEventQueue, History, InterruptNotifier,
            KeyHandler, Keypress, LineEditorHooks, OutputDevice, OutputDeviceExt,
            SafeKeyHandler, StdMutex, StdoutMock};

/// Remembers every key it is given, and does nothing else.
#[derive(Debug, Default)]
pub struct RecordingKeyHandler {
    pub keys: Vec<Keypress>,
}

impl KeyHandler for RecordingKeyHandler {
    fn handle_key(&mut self, key: &Keypress, _editor: &mut EditorCore) {
        self.keys.push(key.clone());
    }
}

/// [`LineEditorHooks`] with no editor behind them.
#[allow(missing_debug_implementations)]
pub struct FakeLineEditorHooks {
    pub key_handler: SafeKeyHandler,
    pub prompt: String,
    pub is_terminal: bool,
}

impl FakeLineEditorHooks {
    pub fn new(is_terminal: bool) -> Self {
        Self {
            key_handler: Arc::new(StdMutex::new(RecordingKeyHandler::default())),
            prompt: String::new(),
            is_terminal,
        }
    }
}

impl LineEditorHooks for FakeLineEditorHooks {
    fn key_handler(&self) -> SafeKeyHandler { self.key_handler.clone() }

    fn set_key_handler(&mut self, key_handler: SafeKeyHandler) {
        self.key_handler = key_handler;
    }

    fn prompt(&self) -> String { self.prompt.clone() }

    fn set_prompt(&mut self, prompt: String) { self.prompt = prompt; }

    fn is_terminal(&self) -> bool { self.is_terminal }
}

/// An [`EditorCore`] attached to a mock terminal, with a small history.
pub fn new_test_editor_core() -> (EditorCore, UnboundedReceiver<EditorEvent>, StdoutMock)
{
    let (output_device, stdout_mock) = OutputDevice::new_mock();
    let (editor, events) = EditorCore::new(
        output_device,
        Arc::new(StdMutex::new(History::new(10))),
        true,
        InterruptNotifier::new(),
        ExitEventQueue::new(),
    );
    (editor, events, stdout_mock)
}
