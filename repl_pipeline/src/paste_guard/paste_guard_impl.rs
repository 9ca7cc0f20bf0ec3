// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{io::Write, sync::Arc};

use miette::IntoDiagnostic;
use thiserror::Error;

use crate::{DEBUG_PASTE_GUARD_MOD, LineEditorHooks, PasteFilter, SafeBool,
            SafeKeyHandler, StdMutex, is_dumb_terminal};

/// Asks the terminal to wrap pasted text in `ESC[200~` .. `ESC[201~`.
pub const BRACKETED_PASTE_ENABLE: &str = "\x1b[?2004h";
/// Undoes [`BRACKETED_PASTE_ENABLE`].
pub const BRACKETED_PASTE_DISABLE: &str = "\x1b[?2004l";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PasteGuardError {
    /// The terminal sent a paste start marker while the key handler is already wrapped
    /// in a [`PasteFilter`]. Wrapping it again would make the filter unremovable.
    #[error("Paste start received while a paste is already in progress")]
    AlreadyPasting,
}

#[allow(missing_debug_implementations)]
pub enum PasteState {
    Normal,
    Pasting { saved_key_handler: SafeKeyHandler },
}

/// Turns bracketed paste on for the terminal and, for the duration of each paste, swaps
/// the line editor's key handler for a [`PasteFilter`].
///
/// ```text
/// Normal --paste-start--> Pasting { saved } --paste-end--> Normal
///             |                                    ^
///             +-- key handler = PasteFilter(saved) |
///                                 key handler = saved
/// ```
///
/// [`Self::is_pasting_flag()`] hands out a shared flag so the
/// [`crate::EvalScheduler`] can refuse to run a line while a paste is in progress.
#[allow(missing_debug_implementations)]
pub struct PasteGuard {
    pub state: PasteState,
    pub is_pasting: SafeBool,
    pub installed: bool,
}

impl Default for PasteGuard {
    fn default() -> Self { Self::new() }
}

impl PasteGuard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: PasteState::Normal,
            is_pasting: Arc::new(StdMutex::new(false)),
            installed: false,
        }
    }

    /// Reads `TERM` from the environment, and then delegates to
    /// [`Self::install_with_term()`].
    pub fn install(
        &mut self,
        hooks: &dyn LineEditorHooks,
        output: &mut dyn Write,
    ) -> miette::Result<&'static str> {
        let maybe_term = std::env::var("TERM").ok();
        self.install_with_term(hooks, output, maybe_term.as_deref())
    }

    /// Writes [`BRACKETED_PASTE_ENABLE`] to `output` and returns the sequence that turns
    /// it off again, which the caller must write on shutdown.
    ///
    /// Nothing is written and an empty string is returned if the line editor isn't
    /// attached to a terminal or `maybe_term` is `dumb`. In that case paste markers are
    /// never expected, and if they show up anyway they are ignored.
    pub fn install_with_term(
        &mut self,
        hooks: &dyn LineEditorHooks,
        output: &mut dyn Write,
        maybe_term: Option<&str>,
    ) -> miette::Result<&'static str> {
        if !hooks.is_terminal() || is_dumb_terminal(maybe_term) {
            return Ok("");
        }

        output
            .write_all(BRACKETED_PASTE_ENABLE.as_bytes())
            .into_diagnostic()?;
        output.flush().into_diagnostic()?;
        self.installed = true;

        Ok(BRACKETED_PASTE_DISABLE)
    }

    /// # Errors
    ///
    /// [`PasteGuardError::AlreadyPasting`] if a paste is already in progress, or if the
    /// current key handler is already a [`PasteFilter`]. The key handler is left as is.
    ///
    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock.
    pub fn on_paste_start(
        &mut self,
        hooks: &mut dyn LineEditorHooks,
    ) -> Result<(), PasteGuardError> {
        if !self.installed {
            return Ok(());
        }

        let current_key_handler = hooks.key_handler();
        let already_wrapped = current_key_handler.lock().unwrap().is_paste_filter();
        if already_wrapped || matches!(self.state, PasteState::Pasting { .. }) {
            return Err(PasteGuardError::AlreadyPasting);
        }

        let filter = PasteFilter::new(current_key_handler.clone());
        hooks.set_key_handler(Arc::new(StdMutex::new(filter)));
        self.state = PasteState::Pasting {
            saved_key_handler: current_key_handler,
        };
        *self.is_pasting.lock().unwrap() = true;

        DEBUG_PASTE_GUARD_MOD.then(|| {
            tracing::debug!(message = "PasteGuard -> paste start");
        });

        Ok(())
    }

    /// Restores the key handler that was saved by [`Self::on_paste_start()`]. A paste
    /// end with no paste in progress is ignored.
    ///
    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock.
    pub fn on_paste_end(&mut self, hooks: &mut dyn LineEditorHooks) {
        if !self.installed {
            return;
        }

        match std::mem::replace(&mut self.state, PasteState::Normal) {
            PasteState::Pasting { saved_key_handler } => {
                hooks.set_key_handler(saved_key_handler);
                *self.is_pasting.lock().unwrap() = false;
                DEBUG_PASTE_GUARD_MOD.then(|| {
                    tracing::debug!(message = "PasteGuard -> paste end");
                });
            }
            PasteState::Normal => {
                tracing::warn!(message = "PasteGuard -> paste end with no paste start");
            }
        }
    }

    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock.
    #[must_use]
    pub fn is_pasting(&self) -> bool { *self.is_pasting.lock().unwrap() }

    #[must_use]
    pub fn is_pasting_flag(&self) -> SafeBool { self.is_pasting.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test_fixtures::{FakeLineEditorHooks, RecordingKeyHandler}};
    use pretty_assertions::assert_eq;

    fn installed_guard(hooks: &FakeLineEditorHooks) -> PasteGuard {
        let mut guard = PasteGuard::new();
        let mut output: Vec<u8> = vec![];
        let disable = guard
            .install_with_term(hooks, &mut output, Some("xterm-256color"))
            .unwrap();
        assert_eq!(disable, BRACKETED_PASTE_DISABLE);
        assert_eq!(String::from_utf8(output).unwrap(), BRACKETED_PASTE_ENABLE);
        guard
    }

    #[test]
    fn test_install_is_skipped_for_non_terminal_and_dumb_terminal() {
        let mut output: Vec<u8> = vec![];

        let not_a_tty = FakeLineEditorHooks::new(false);
        let mut guard = PasteGuard::new();
        assert_eq!(
            guard
                .install_with_term(&not_a_tty, &mut output, Some("xterm"))
                .unwrap(),
            ""
        );
        assert!(!guard.installed);

        let dumb = FakeLineEditorHooks::new(true);
        assert_eq!(
            guard
                .install_with_term(&dumb, &mut output, Some("dumb"))
                .unwrap(),
            ""
        );
        assert!(!guard.installed);
        assert!(output.is_empty());
    }

    #[test]
    fn test_paste_start_wraps_and_paste_end_restores() {
        let mut hooks = FakeLineEditorHooks::new(true);
        let original = hooks.key_handler();
        let mut guard = installed_guard(&hooks);

        guard.on_paste_start(&mut hooks).unwrap();
        assert!(guard.is_pasting());
        assert!(hooks.key_handler().lock().unwrap().is_paste_filter());

        guard.on_paste_end(&mut hooks);
        assert!(!guard.is_pasting());
        assert!(Arc::ptr_eq(&hooks.key_handler(), &original));
    }

    #[test]
    fn test_second_paste_start_is_rejected() {
        let mut hooks = FakeLineEditorHooks::new(true);
        let mut guard = installed_guard(&hooks);

        guard.on_paste_start(&mut hooks).unwrap();
        let filter = hooks.key_handler();
        assert_eq!(
            guard.on_paste_start(&mut hooks),
            Err(PasteGuardError::AlreadyPasting)
        );
        // Not double wrapped.
        assert!(Arc::ptr_eq(&hooks.key_handler(), &filter));
    }

    #[test]
    fn test_paste_start_rejected_if_handler_is_already_a_filter() {
        let mut hooks = FakeLineEditorHooks::new(true);
        let inner: SafeKeyHandler =
            Arc::new(StdMutex::new(RecordingKeyHandler::default()));
        hooks.set_key_handler(Arc::new(StdMutex::new(PasteFilter::new(inner))));
        let mut guard = installed_guard(&hooks);

        assert_eq!(
            guard.on_paste_start(&mut hooks),
            Err(PasteGuardError::AlreadyPasting)
        );
        assert!(!guard.is_pasting());
    }

    #[test]
    fn test_markers_ignored_when_not_installed() {
        let mut hooks = FakeLineEditorHooks::new(false);
        let original = hooks.key_handler();
        let mut guard = PasteGuard::new();

        guard.on_paste_start(&mut hooks).unwrap();
        guard.on_paste_end(&mut hooks);
        assert!(!guard.is_pasting());
        assert!(Arc::ptr_eq(&hooks.key_handler(), &original));
    }

    #[test]
    fn test_paste_end_without_start_is_ignored() {
        let mut hooks = FakeLineEditorHooks::new(true);
        let original = hooks.key_handler();
        let mut guard = installed_guard(&hooks);

        guard.on_paste_end(&mut hooks);
        assert!(!guard.is_pasting());
        assert!(Arc::ptr_eq(&hooks.key_handler(), &original));
    }

    #[test]
    fn test_is_pasting_flag_is_shared() {
        let mut hooks = FakeLineEditorHooks::new(true);
        let mut guard = installed_guard(&hooks);
        let flag = guard.is_pasting_flag();

        guard.on_paste_start(&mut hooks).unwrap();
        assert!(*flag.lock().unwrap());
        guard.on_paste_end(&mut hooks);
        assert!(!*flag.lock().unwrap());
    }
}
