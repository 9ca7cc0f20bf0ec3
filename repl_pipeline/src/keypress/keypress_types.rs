// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use strum_macros::{AsRefStr, Display, EnumString};

/// The escape character that starts every CSI / SS3 sequence.
pub const ANSI_ESC: char = '\x1b';
/// What `Backspace` sends on most terminals.
pub const ASCII_DEL: char = '\x7f';

/// Symbolic names of the keys the [`crate::KeypressParser`] knows about. Anything else
/// has a [`Keypress::name`] of [None] (punctuation, unknown sequences), or a single
/// lower case letter or digit.
#[derive(Clone, Copy, Debug, Eq, PartialEq, AsRefStr, Display, EnumString)]
pub enum KeyName {
    #[strum(to_string = "return")]
    Return,
    #[strum(to_string = "enter")]
    Enter,
    #[strum(to_string = "tab")]
    Tab,
    #[strum(to_string = "space")]
    Space,
    #[strum(to_string = "backspace")]
    Backspace,
    #[strum(to_string = "escape")]
    Escape,
    #[strum(to_string = "up")]
    Up,
    #[strum(to_string = "down")]
    Down,
    #[strum(to_string = "right")]
    Right,
    #[strum(to_string = "left")]
    Left,
    #[strum(to_string = "home")]
    Home,
    #[strum(to_string = "end")]
    End,
    #[strum(to_string = "insert")]
    Insert,
    #[strum(to_string = "delete")]
    Delete,
    #[strum(to_string = "pageup")]
    PageUp,
    #[strum(to_string = "pagedown")]
    PageDown,
    #[strum(to_string = "f1")]
    F1,
    #[strum(to_string = "f2")]
    F2,
    #[strum(to_string = "f3")]
    F3,
    #[strum(to_string = "f4")]
    F4,
    /// Synthetic key, `ESC[200~`.
    #[strum(to_string = "paste-start")]
    PasteStart,
    /// Synthetic key, `ESC[201~`.
    #[strum(to_string = "paste-end")]
    PasteEnd,
}

/// One decoded terminal key event.
///
/// - `sequence`: the literal characters the terminal sent for this key.
/// - `name`: the symbolic name, see [`KeyName`], or the lower case letter / digit.
/// - `code`: only set for CSI / SS3 sequences, eg: `[D` for left, `[3~` for delete.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Keypress {
    pub sequence: Option<String>,
    pub name: Option<String>,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub code: Option<String>,
}

impl Keypress {
    #[must_use]
    pub fn is(&self, key_name: KeyName) -> bool {
        self.name.as_deref() == Some(key_name.as_ref())
    }

    /// The single printable character this key inserts, if it is one.
    #[must_use]
    pub fn printable_char(&self) -> Option<char> {
        if self.ctrl || self.meta || self.code.is_some() {
            return None;
        }
        let sequence = self.sequence.as_deref()?;
        let mut chars = sequence.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) if !ch.is_control() => Some(ch),
            _ => None,
        }
    }
}
