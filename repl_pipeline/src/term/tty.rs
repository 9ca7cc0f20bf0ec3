// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::io::IsTerminal;

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum TTYResult {
    IsInteractive,
    IsNotInteractive,
}

impl From<bool> for TTYResult {
    fn from(is_tty: bool) -> Self {
        if is_tty {
            TTYResult::IsInteractive
        } else {
            TTYResult::IsNotInteractive
        }
    }
}

/// Returns [`TTYResult::IsInteractive`] if stdin is an interactive terminal (TTY). If
/// you run `echo "1 + 1" | repl_demo` this returns [`TTYResult::IsNotInteractive`].
#[must_use]
pub fn is_stdin_interactive() -> TTYResult { std::io::stdin().is_terminal().into() }

/// Returns [`TTYResult::IsInteractive`] if both stdin and stdout are TTYs. The line
/// editor only echoes and renders the prompt, and bracketed paste is only turned on,
/// when this is the case.
#[must_use]
pub fn is_fully_interactive() -> TTYResult {
    (std::io::stdin().is_terminal() && std::io::stdout().is_terminal()).into()
}

/// `TERM=dumb` terminals don't understand escape sequences.
#[must_use]
pub fn is_dumb_terminal(maybe_term: Option<&str>) -> bool { maybe_term == Some("dumb") }
