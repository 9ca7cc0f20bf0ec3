// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::Arc;

use crate::StdMutex;

/// `Ctrl+C`.
pub const CTRL_C: char = '\u{3}';
/// `Ctrl+D`.
pub const CTRL_D: char = '\u{4}';
/// Characters that are forwarded as soon as they are received, no matter what mode the
/// [`crate::InputGate`] is in.
pub const DEFAULT_INTERRUPT_CHARS: [char; 2] = [CTRL_C, CTRL_D];

/// One unit of pending input held in the [`crate::InputGate`] queue.
///
/// A run of ordinary characters is coalesced into one [`GateToken::Text`] so that it is
/// flushed as one chunk. A line ending (`\n`, `\r` or `\r\n`) is always its own token,
/// so `\r\n` is never split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateToken {
    Text(String),
    LineEnding(String),
    End,
}

impl GateToken {
    #[must_use]
    pub fn is_line_ending(&self) -> bool { matches!(self, GateToken::LineEnding(_)) }
}

/// What the [`crate::InputGate`] hands to its [`GateSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateChunk {
    Data(String),
    End,
}

impl From<GateToken> for GateChunk {
    fn from(token: GateToken) -> Self {
        match token {
            GateToken::Text(text) | GateToken::LineEnding(text) => GateChunk::Data(text),
            GateToken::End => GateChunk::End,
        }
    }
}

/// The downstream consumer of the [`crate::InputGate`], usually the line editor.
///
/// The gate calls [`GateSink::push`] without holding its own lock, so an implementation
/// is free to call back into the gate (eg: [`crate::InputGate::next_line()`]) from
/// inside `push`. Such a reentrant call never starts a nested flush; the outer flush
/// picks up whatever it changed.
pub trait GateSink: Send {
    fn push(&mut self, chunk: GateChunk);

    /// While this returns `true` the gate keeps queued input to itself. Interrupt
    /// characters and end of stream are still delivered.
    fn is_paused(&self) -> bool { false }
}

pub type SafeGateSink = Arc<StdMutex<dyn GateSink>>;
