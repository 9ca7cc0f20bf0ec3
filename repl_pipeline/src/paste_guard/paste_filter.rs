// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{DEBUG_PASTE_GUARD_MOD, EditorCore, KeyHandler, KeyName, Keypress,
            SafeKeyHandler};

/// Named keys that still mean "insert this" while a paste is in progress. Every other
/// named key (arrows, `backspace`, `escape`, function keys) is dropped.
pub const PASTE_ALLOWED_KEY_NAMES: [KeyName; 4] =
    [KeyName::Tab, KeyName::Return, KeyName::Enter, KeyName::Space];

/// Wraps the line editor's key handler for the duration of a bracketed paste. Pasted
/// text is inserted literally: a key that would edit or navigate the line instead of
/// inserting a character never reaches the wrapped handler.
///
/// The decision is made per key, with no buffering, so the order of the keys that are
/// forwarded is the order they were pasted in.
#[allow(missing_debug_implementations)]
pub struct PasteFilter {
    pub inner: SafeKeyHandler,
}

impl PasteFilter {
    pub fn new(inner: SafeKeyHandler) -> Self { Self { inner } }

    /// A key is dropped if:
    /// 1. It has a `ctrl` or `meta` modifier, or it came from an escape sequence (it has
    ///    a `code`).
    /// 2. It has a name, that name isn't just its own lower cased sequence (`a` for `a`
    ///    or `A`), and it isn't one of [`PASTE_ALLOWED_KEY_NAMES`].
    ///
    /// Everything else is forwarded.
    #[must_use]
    pub fn should_forward(key: &Keypress) -> bool {
        if key.ctrl || key.meta || key.code.is_some() {
            return false;
        }

        let Some(name) = key.name.as_deref() else {
            return true;
        };

        let lower_case_sequence = key.sequence.as_deref().map(str::to_lowercase);
        if lower_case_sequence.as_deref() == Some(name) {
            return true;
        }

        PASTE_ALLOWED_KEY_NAMES
            .iter()
            .any(|allowed| allowed.as_ref() == name)
    }
}

impl KeyHandler for PasteFilter {
    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock.
    fn handle_key(&mut self, key: &Keypress, editor: &mut EditorCore) {
        if Self::should_forward(key) {
            self.inner.lock().unwrap().handle_key(key, editor);
        } else {
            // % is Display, ? is Debug.
            DEBUG_PASTE_GUARD_MOD.then(|| {
                tracing::debug!(
                    message = "PasteFilter -> dropped key",
                    key = ?key
                );
            });
        }
    }

    fn is_paste_filter(&self) -> bool { true }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{KeypressParser, test_fixtures::{RecordingKeyHandler,
                                                 new_test_editor_core}};
    use std::sync::Arc;
    use test_case::test_case;

    fn single_key(input: &str) -> Keypress {
        let mut keys = KeypressParser::new().parse(input);
        assert_eq!(keys.len(), 1);
        keys.remove(0)
    }

    #[test_case("a", true ; "lower case letter")]
    #[test_case("Q", true ; "upper case letter")]
    #[test_case("7", true ; "digit")]
    #[test_case("{", true ; "punctuation has no name")]
    #[test_case("é", true ; "non ascii has no name")]
    #[test_case("\t", true ; "tab")]
    #[test_case("\r", true ; "return")]
    #[test_case("\n", true ; "enter")]
    #[test_case(" ", true ; "space")]
    #[test_case("\x7f", false ; "backspace")]
    #[test_case("\x03", false ; "ctrl c")]
    #[test_case("\x1bb", false ; "meta b")]
    #[test_case("\x1b[D", false ; "left arrow")]
    #[test_case("\x1b[3~", false ; "delete key")]
    #[test_case("\x1bOP", false ; "f1")]
    fn test_should_forward(input: &str, expected: bool) {
        assert_eq!(PasteFilter::should_forward(&single_key(input)), expected);
    }

    #[test]
    fn test_lone_escape_is_dropped() {
        let keys = KeypressParser::new().parse("\x1b");
        assert!(!PasteFilter::should_forward(&keys[0]));
    }

    #[test]
    fn test_forwarded_keys_keep_their_order() {
        let recorder = Arc::new(crate::StdMutex::new(RecordingKeyHandler::default()));
        let mut filter = PasteFilter::new(recorder.clone());
        let (mut editor, _events, _stdout_mock) = new_test_editor_core();

        for key in KeypressParser::new().parse("ab\x1b[Dc\x7fd\r") {
            filter.handle_key(&key, &mut editor);
        }

        let sequences: Vec<String> = recorder
            .lock()
            .unwrap()
            .keys
            .iter()
            .filter_map(|it| it.sequence.clone())
            .collect();
        assert_eq!(sequences, vec!["a", "b", "c", "d", "\r"]);
    }
}
