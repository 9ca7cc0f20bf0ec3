// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The `r3bl_repl_pipeline` library is the part of an interactive shell that sits
//! between raw terminal bytes and an expression evaluator. It makes line oriented,
//! long running and possibly asynchronous evaluation safe to drive from a single
//! event loop.
//!
//! # Why use this crate
//!
//! A REPL that awaits an async evaluation has a few problems that a blocking
//! [`read_line()`](https://doc.rust-lang.org/std/io/struct.Stdin.html#method.read_line)
//! REPL never sees:
//!
//! 1. Keystrokes typed while an evaluation is in flight get echoed against a stale
//!    prompt, and the line editor interprets them before the result is printed.
//! 2. Pasting multi-line text runs each line as soon as its newline arrives, and any
//!    bytes in the paste that look like escape sequences move the cursor around.
//! 3. `Ctrl+C` has to cancel an evaluation that is suspended at an `.await`, without
//!    leaving the terminal stuck in cooked mode.
//! 4. Multi-line input that took several `Enter` presses to become complete leaves a
//!    partial line in the history for each press.
//!
//! # Pipeline
//!
//! ```text
//! terminal bytes
//!   -> InputGate      (byte level, withholds input after a line ending)
//!   -> LineEditor     (keypress decoding, PasteGuard, EmacsKeyHandler)
//!   -> AsyncRepl      (accumulates lines, owns the prompt)
//!   -> EvalScheduler  (evaluator vs interrupt race, raw mode, deferred exit)
//!   -> EvalEvent      (HistoryCoalescer, any other listener)
//! ```
//!
//! 1. [`InputGate`] decodes terminal bytes into characters. In blocking mode it
//!    forwards everything up to and including the first line ending, and then queues
//!    the rest until [`InputGate::next_line()`] is called. Interrupt characters
//!    (`Ctrl+C`, `Ctrl+D`) are never queued.
//! 2. [`LineEditor`] turns the forwarded bytes into [`Keypress`] events. When the
//!    terminal reports a bracketed paste, the [`PasteGuard`] swaps the editor's key
//!    handler for a [`PasteFilter`] that drops control and escape keys, so the paste is
//!    inserted literally.
//! 3. [`EvalScheduler`] runs one [`Evaluator`] call per submitted buffer. It emits
//!    [`EvalEvent::Start`] and [`EvalEvent::Finish`], turns raw mode off while it waits
//!    (so `Ctrl+C` arrives as `SIGINT`), defers exit requests via [`ExitEventQueue`],
//!    and races the evaluation against the [`InterruptNotifier`] using
//!    [`tokio::select!`].
//! 4. [`HistoryCoalescer`] listens for finish events and collapses a multi-line entry
//!    into one history record.
//!
//! [`AsyncRepl`] wires all of these together, and the `repl_demo` binary runs it with
//! a small [`ArithmeticEvaluator`].
//!
//! # Ordering guarantees
//!
//! - Within one evaluation [`EvalEvent::Start`] always precedes [`EvalEvent::Finish`].
//! - The gate only releases input queued after a line ending when the line editor's
//!   prompt redisplay calls [`InputGate::next_line()`]. The scheduler never calls it.
//! - Interrupt characters are delivered with no queuing delay, in any gate mode.
//! - The paste filter decides per keystroke with no buffering, so pasted characters keep
//!   their order.
//!
//! # Logging
//!
//! Use [`try_initialize_logging_global()`] with a [`TracingConfig`] to send the
//! `tracing` output of this crate to stdout, stderr, an [`OutputDevice`], a file, or a
//! display and a file.

// Enforce strict error handling in production library code only. Tests are allowed to
// use .unwrap() (workspace `Cargo.toml` config allows it).
#![cfg_attr(not(test), deny(clippy::unwrap_in_result))]

// Attach sources.
pub mod arithmetic_evaluator;
pub mod config;
pub mod eval_scheduler;
pub mod history;
pub mod input_gate;
pub mod keypress;
pub mod line_editor;
pub mod log;
pub mod paste_guard;
pub mod recoverable;
pub mod repl;
pub mod term;
#[cfg(test)]
pub mod test_fixtures;

// Re-export.
pub use arithmetic_evaluator::*;
pub use config::*;
pub use eval_scheduler::*;
pub use history::*;
pub use input_gate::*;
pub use keypress::*;
pub use line_editor::*;
pub use log::*;
pub use paste_guard::*;
pub use recoverable::*;
pub use repl::*;
pub use term::*;
#[cfg(test)]
pub use test_fixtures::*;

// Type aliases.
use futures_core::Stream;
use std::{pin::Pin, sync::Arc};

pub type StdMutex<T> = std::sync::Mutex<T>;

pub type SendRawTerminal = dyn std::io::Write + Send;
pub type SafeRawTerminal = Arc<StdMutex<SendRawTerminal>>;

pub type SafeHistory = Arc<StdMutex<History>>;
pub type SafeBool = Arc<StdMutex<bool>>;

pub type PinnedInputStream<T> = Pin<Box<dyn Stream<Item = T> + Send>>;

// Constants.
pub const CHANNEL_CAPACITY: usize = 1_000;
pub const HISTORY_SIZE_MAX: usize = 1_000;

// Debug switches.
pub const DEBUG_INPUT_GATE_MOD: bool = false;
pub const DEBUG_EVAL_SCHEDULER_MOD: bool = true;
pub const DEBUG_PASTE_GUARD_MOD: bool = true;
pub const DEBUG_HISTORY_MOD: bool = true;
pub const DEBUG_REPL_MOD: bool = true;
