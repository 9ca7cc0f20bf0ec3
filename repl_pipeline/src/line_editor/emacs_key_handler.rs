// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::str::FromStr;

use crate::{EditorCore, KeyHandler, KeyName, Keypress};

/// The default key bindings of the [`crate::LineEditor`].
///
/// | Key                      | Action                                  |
/// |--------------------------|-----------------------------------------|
/// | `Return`, `Enter`        | submit (`\r\n` submits once)            |
/// | `Ctrl+C`                 | interrupt                               |
/// | `Ctrl+D`                 | delete forward, or end of transmission  |
/// | `Backspace`, `Ctrl+H`    | delete backward                         |
/// | `Delete`                 | delete forward                          |
/// | `Left`, `Right`          | move the cursor                         |
/// | `Home`, `End`            | move to start / end                     |
/// | `Up`, `Down`             | older / newer history entry             |
///
/// With the `emacs` feature, `Ctrl+A`, `Ctrl+E`, `Ctrl+B`, `Ctrl+F`, `Ctrl+K`,
/// `Ctrl+U`, `Ctrl+P`, `Ctrl+N` work as they do in readline.
#[derive(Debug, Default)]
pub struct EmacsKeyHandler {
    saw_return: bool,
}

impl KeyHandler for EmacsKeyHandler {
    fn handle_key(&mut self, key: &Keypress, editor: &mut EditorCore) {
        let saw_return = std::mem::take(&mut self.saw_return);

        if key.ctrl {
            handle_ctrl_key(key, editor);
            return;
        }

        // No meta bindings.
        if key.meta {
            return;
        }

        let maybe_key_name = key.name.as_deref().and_then(|it| KeyName::from_str(it).ok());

        match maybe_key_name {
            Some(KeyName::Return) => {
                self.saw_return = true;
                editor.submit();
            }
            Some(KeyName::Enter) => {
                if !saw_return {
                    editor.submit();
                }
            }
            Some(KeyName::Backspace) => editor.delete_before_cursor(),
            Some(KeyName::Delete) => editor.delete_at_cursor(),
            Some(KeyName::Left) => editor.move_cursor_left(),
            Some(KeyName::Right) => editor.move_cursor_right(),
            Some(KeyName::Home) => editor.move_cursor_to_start(),
            Some(KeyName::End) => editor.move_cursor_to_end(),
            Some(KeyName::Up) => editor.history_older(),
            Some(KeyName::Down) => editor.history_newer(),
            Some(KeyName::Tab) => editor.insert_char('\t'),
            Some(KeyName::Space) => editor.insert_char(' '),
            _ => {
                if let Some(ch) = key.printable_char() {
                    editor.insert_char(ch);
                }
            }
        }
    }
}

fn handle_ctrl_key(key: &Keypress, editor: &mut EditorCore) {
    match key.name.as_deref() {
        Some("c") => editor.interrupt(),
        Some("d") => editor.end_of_transmission(),
        Some("h" | "backspace") => editor.delete_before_cursor(),
        #[cfg(feature = "emacs")]
        Some("a") => editor.move_cursor_to_start(),
        #[cfg(feature = "emacs")]
        Some("e") => editor.move_cursor_to_end(),
        #[cfg(feature = "emacs")]
        Some("b") => editor.move_cursor_left(),
        #[cfg(feature = "emacs")]
        Some("f") => editor.move_cursor_right(),
        #[cfg(feature = "emacs")]
        Some("k") => editor.kill_to_end(),
        #[cfg(feature = "emacs")]
        Some("u") => editor.kill_to_start(),
        #[cfg(feature = "emacs")]
        Some("p") => editor.history_older(),
        #[cfg(feature = "emacs")]
        Some("n") => editor.history_newer(),
        _ => {}
    }
}
