// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crossterm::terminal::{disable_raw_mode, enable_raw_mode, is_raw_mode_enabled};
use miette::IntoDiagnostic;

/// Raw mode control, injected into the [`crate::EvalScheduler`] so that tests don't
/// touch the real terminal.
///
/// While an evaluation that can be interrupted is pending, raw mode is turned off so
/// that `Ctrl+C` is delivered by the OS as `SIGINT`.
pub trait TerminalModeControl: Send {
    fn is_raw_mode(&self) -> bool;

    /// Returns the mode that was active before this call.
    ///
    /// # Errors
    ///
    /// If the terminal mode can't be changed.
    fn set_raw_mode(&mut self, enabled: bool) -> miette::Result<bool>;
}

/// The real terminal, via [crossterm].
#[derive(Debug, Default, Clone, Copy)]
pub struct CrosstermTerminalMode;

impl TerminalModeControl for CrosstermTerminalMode {
    fn is_raw_mode(&self) -> bool { is_raw_mode_enabled().unwrap_or(false) }

    fn set_raw_mode(&mut self, enabled: bool) -> miette::Result<bool> {
        let previous = self.is_raw_mode();
        if enabled {
            enable_raw_mode().into_diagnostic()?;
        } else {
            disable_raw_mode().into_diagnostic()?;
        }
        Ok(previous)
    }
}

/// Used when stdin is not a terminal (piped input). There is no mode to change.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTerminalMode;

impl TerminalModeControl for NoopTerminalMode {
    fn is_raw_mode(&self) -> bool { false }

    fn set_raw_mode(&mut self, _enabled: bool) -> miette::Result<bool> { Ok(false) }
}
