// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{io::{self, Write},
          sync::Arc};

use crossterm::{QueueableCommand, cursor,
                style::Print,
                terminal::{Clear, ClearType}};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use unicode_width::UnicodeWidthStr;

use crate::{EmacsKeyHandler, ExitEventQueue, InterruptNotifier, LineEditorHooks,
            OutputDevice, SafeHistory, SafeKeyHandler, StdMutex,
            lock_output_device_as_mut};

/// What the line editor reports to its host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// A submitted line, without its line ending.
    Line(String),
    /// `Ctrl+C` while no evaluation was listening for it.
    Interrupted,
    /// `Ctrl+D` on an empty line in multi line editor mode.
    Eof,
}

/// The line being edited, its cursor and prompt, and how it is drawn.
///
/// Key handlers (see [`crate::KeyHandler`]) get a `&mut EditorCore` and call its editing
/// methods. Every edit re-renders the line, unless the output isn't a terminal, in
/// which case nothing is echoed.
///
/// The cursor is a char index into [`Self::line`]. The rendered column accounts for
/// the display width of wide characters.
#[allow(missing_debug_implementations)]
pub struct EditorCore {
    pub line: String,
    pub cursor: usize,
    pub prompt: String,
    pub output_device: OutputDevice,
    pub safe_history: SafeHistory,
    pub is_terminal: bool,
    pub interrupt_notifier: InterruptNotifier,
    pub exit_event_queue: ExitEventQueue,
    /// `Ctrl+D` ends the multi line buffer instead of the session.
    pub multi_line_editor_mode: bool,
    key_handler: SafeKeyHandler,
    event_sender: UnboundedSender<EditorEvent>,
}

impl EditorCore {
    pub fn new(
        output_device: OutputDevice,
        safe_history: SafeHistory,
        is_terminal: bool,
        interrupt_notifier: InterruptNotifier,
        exit_event_queue: ExitEventQueue,
    ) -> (Self, UnboundedReceiver<EditorEvent>) {
        let (event_sender, event_receiver) = tokio::sync::mpsc::unbounded_channel();
        let it = Self {
            line: String::new(),
            cursor: 0,
            prompt: String::new(),
            output_device,
            safe_history,
            is_terminal,
            interrupt_notifier,
            exit_event_queue,
            multi_line_editor_mode: false,
            key_handler: Arc::new(StdMutex::new(EmacsKeyHandler::default())),
            event_sender,
        };
        (it, event_receiver)
    }

    fn send(&self, event: EditorEvent) {
        // The host may be gone during shutdown.
        self.event_sender.send(event).ok();
    }

    fn char_count(&self) -> usize { self.line.chars().count() }

    fn byte_index(&self, char_index: usize) -> usize {
        self.line
            .char_indices()
            .nth(char_index)
            .map_or(self.line.len(), |(byte_index, _)| byte_index)
    }
}

// Editing.
impl EditorCore {
    pub fn insert_char(&mut self, ch: char) {
        let byte_index = self.byte_index(self.cursor);
        self.line.insert(byte_index, ch);
        self.cursor += 1;
        self.refresh();
    }

    pub fn delete_before_cursor(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let byte_index = self.byte_index(self.cursor);
        self.line.remove(byte_index);
        self.refresh();
    }

    pub fn delete_at_cursor(&mut self) {
        if self.cursor >= self.char_count() {
            return;
        }
        let byte_index = self.byte_index(self.cursor);
        self.line.remove(byte_index);
        self.refresh();
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
        self.refresh();
    }

    pub fn move_cursor_right(&mut self) {
        self.cursor = usize::min(self.cursor + 1, self.char_count());
        self.refresh();
    }

    pub fn move_cursor_to_start(&mut self) {
        self.cursor = 0;
        self.refresh();
    }

    pub fn move_cursor_to_end(&mut self) {
        self.cursor = self.char_count();
        self.refresh();
    }

    pub fn kill_to_end(&mut self) {
        let byte_index = self.byte_index(self.cursor);
        self.line.truncate(byte_index);
        self.refresh();
    }

    pub fn kill_to_start(&mut self) {
        let byte_index = self.byte_index(self.cursor);
        self.line.replace_range(..byte_index, "");
        self.cursor = 0;
        self.refresh();
    }

    /// Put `line` in the buffer with the cursor at its end.
    pub fn replace_line(&mut self, line: String) {
        self.line = line;
        self.cursor = self.char_count();
        self.refresh();
    }

    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock.
    pub fn history_older(&mut self) {
        let maybe_entry = self
            .safe_history
            .lock()
            .unwrap()
            .search_next()
            .map(ToString::to_string);
        if let Some(entry) = maybe_entry {
            self.replace_line(entry);
        }
    }

    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock.
    pub fn history_newer(&mut self) {
        let maybe_entry = self
            .safe_history
            .lock()
            .unwrap()
            .search_previous()
            .map(ToString::to_string);
        if let Some(entry) = maybe_entry {
            self.replace_line(entry);
        }
    }

    /// Adds the line to the history and hands it to the host. The prompt stays as it
    /// is until the host displays a new one.
    ///
    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock.
    pub fn submit(&mut self) {
        let line = std::mem::take(&mut self.line);
        self.cursor = 0;
        self.write_to_terminal("\r\n");

        if !line.trim().is_empty() {
            self.safe_history.lock().unwrap().update(Some(line.clone()));
        }

        self.send(EditorEvent::Line(line));
    }

    /// If an evaluation is waiting for an interrupt it gets it. Otherwise the line is
    /// abandoned.
    pub fn interrupt(&mut self) {
        if self.interrupt_notifier.notify() > 0 {
            return;
        }
        self.line.clear();
        self.cursor = 0;
        self.write_to_terminal("^C\r\n");
        self.send(EditorEvent::Interrupted);
    }

    /// `Ctrl+D`: deletes forward on a non empty line, otherwise ends the multi line
    /// buffer or asks to exit.
    pub fn end_of_transmission(&mut self) {
        if !self.line.is_empty() {
            self.delete_at_cursor();
        } else if self.multi_line_editor_mode {
            self.send(EditorEvent::Eof);
        } else {
            self.exit_event_queue.request_exit();
        }
    }

    /// The input stream closed. Whatever is left on the line is submitted first.
    pub fn on_end_of_stream(&mut self) {
        if !self.line.is_empty() {
            self.submit();
        }
        if self.multi_line_editor_mode {
            self.send(EditorEvent::Eof);
        }
        self.exit_event_queue.request_exit();
    }
}

// Rendering.
impl EditorCore {
    /// Draw the prompt and the current line.
    pub fn display_prompt(&mut self) { self.refresh(); }

    pub fn refresh(&mut self) {
        if !self.is_terminal {
            return;
        }
        let result = {
            let term = lock_output_device_as_mut!(self.output_device);
            render_line(term, &self.prompt, &self.line, self.cursor)
        };
        if let Err(error) = result {
            // % is Display, ? is Debug.
            tracing::error!(message = "EditorCore -> render failed", error = %error);
        }
    }

    fn write_to_terminal(&self, text: &str) {
        if !self.is_terminal {
            return;
        }
        let result = {
            let term = lock_output_device_as_mut!(self.output_device);
            term.write_all(text.as_bytes()).and_then(|()| term.flush())
        };
        if let Err(error) = result {
            tracing::error!(message = "EditorCore -> write failed", error = %error);
        }
    }
}

fn render_line(
    term: &mut dyn Write,
    prompt: &str,
    line: &str,
    cursor_char_index: usize,
) -> io::Result<()> {
    let before_cursor: String = line.chars().take(cursor_char_index).collect();
    let cursor_col = prompt.width() + before_cursor.width();
    let cursor_col_u16 = u16::try_from(cursor_col).unwrap_or(u16::MAX);

    term.queue(cursor::MoveToColumn(0))?
        .queue(Clear(ClearType::CurrentLine))?
        .queue(Print(prompt))?
        .queue(Print(line))?
        .queue(cursor::MoveToColumn(cursor_col_u16))?;
    term.flush()
}

impl LineEditorHooks for EditorCore {
    fn key_handler(&self) -> SafeKeyHandler { self.key_handler.clone() }

    fn set_key_handler(&mut self, key_handler: SafeKeyHandler) {
        self.key_handler = key_handler;
    }

    fn prompt(&self) -> String { self.prompt.clone() }

    fn set_prompt(&mut self, prompt: String) { self.prompt = prompt; }

    fn is_terminal(&self) -> bool { self.is_terminal }
}
