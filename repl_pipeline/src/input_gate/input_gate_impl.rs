// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{collections::VecDeque, sync::Arc};

use smallvec::SmallVec;

use super::{DEFAULT_INTERRUPT_CHARS, GateChunk, GateToken, SafeGateSink,
            Utf8StreamDecoder};
use crate::{DEBUG_INPUT_GATE_MOD, StdMutex};

/// # Mental model
///
/// The gate sits between the raw terminal input and the line editor. When the user
/// presses `Enter` the line editor starts an evaluation that may take a while. Anything
/// typed after that `Enter` must not reach the line editor until it has printed the
/// result and redisplayed its prompt. So the gate:
///
/// 1. Forwards everything up to and including the first line ending.
/// 2. Turns forwarding off right after emitting that line ending.
/// 3. Queues everything else until [`InputGate::next_line()`] is called.
///
/// [`crate::CTRL_C`] and [`crate::CTRL_D`] are never queued. They are pushed to the sink
/// the moment they are decoded, so an interrupt is observable while input is blocked.
///
/// # Modes
///
/// - Blocking (the default): the algorithm above.
/// - Pass through: every decoded chunk is forwarded as is, in one piece. The decoder is
///   still fed, so switching back to blocking mode mid character is safe.
///
/// # Composition
///
/// The gate is not a stand-in for the input stream. The caller feeds it with
/// [`InputGate::on_data()`] and gives it a [`crate::GateSink`] to push into. It is cheap
/// to clone (two [Arc]s), so the line editor can hold a handle to call
/// [`InputGate::next_line()`] from its prompt redisplay path.
#[derive(Clone)]
#[allow(missing_debug_implementations)]
pub struct InputGate {
    pub safe_state: Arc<StdMutex<GateState>>,
    pub safe_sink: SafeGateSink,
}

#[derive(Debug)]
pub struct GateState {
    pub block_on_newline_enabled: bool,
    pub forwarding: bool,
    pub queue: VecDeque<GateToken>,
    /// Interrupt characters that arrived while a push was in progress. They jump ahead
    /// of [`Self::queue`] and ignore [`Self::forwarding`].
    pub urgent: VecDeque<GateChunk>,
    /// Greater than zero while the sink is being pushed to. No flush may start then.
    pub inside_push: usize,
    /// The last character decoded (interrupts aside) was `\r`. A `\n` that arrives
    /// next, in a later read, finishes that line ending instead of starting a new one.
    pub last_char_was_cr: bool,
    pub interrupt_chars: SmallVec<[char; 2]>,
    pub decoder: Utf8StreamDecoder,
}

impl GateState {
    #[must_use]
    pub fn new(block_on_newline_enabled: bool) -> Self {
        Self {
            block_on_newline_enabled,
            forwarding: true,
            queue: VecDeque::new(),
            urgent: VecDeque::new(),
            inside_push: 0,
            last_char_was_cr: false,
            interrupt_chars: SmallVec::from_slice(&DEFAULT_INTERRUPT_CHARS),
            decoder: Utf8StreamDecoder::new(),
        }
    }

    /// If block on newline is disabled everything is forwarded as is. Otherwise only
    /// while forwarding has not been paused by a line ending.
    #[must_use]
    pub fn should_forward(&self) -> bool {
        !self.block_on_newline_enabled || self.forwarding
    }

    /// Run the coalescing algorithm over `text`. Returns the interrupt characters that
    /// must be pushed right away, in order.
    fn enqueue(&mut self, text: &str) -> SmallVec<[char; 2]> {
        let mut interrupts = SmallVec::new();

        if text.is_empty() {
            return interrupts;
        }

        if !self.block_on_newline_enabled {
            self.last_char_was_cr = text.ends_with('\r');
            self.queue.push_back(GateToken::Text(text.to_string()));
            return interrupts;
        }

        for ch in text.chars() {
            if self.interrupt_chars.contains(&ch) {
                interrupts.push(ch);
                continue;
            }
            let follows_cr = std::mem::replace(&mut self.last_char_was_cr, ch == '\r');
            match ch {
                '\n' => match self.queue.back_mut() {
                    Some(GateToken::LineEnding(ending)) if ending == "\r" => {
                        ending.push('\n');
                    }
                    // The `\r` was already delivered and closed the gate. This `\n` is
                    // the rest of that line ending, so it must not close it a second
                    // time: the line editor treats it as part of the `\r\n` and never
                    // submits a line for it.
                    _ if follows_cr => {
                        self.queue.push_back(GateToken::Text("\n".into()));
                    }
                    _ => self.queue.push_back(GateToken::LineEnding("\n".into())),
                },
                '\r' => self.queue.push_back(GateToken::LineEnding("\r".into())),
                _ => match self.queue.back_mut() {
                    Some(GateToken::Text(run)) if !run.is_empty() => run.push(ch),
                    _ => self.queue.push_back(GateToken::Text(ch.to_string())),
                },
            }
        }

        interrupts
    }
}

impl InputGate {
    pub fn new(safe_sink: SafeGateSink, block_on_newline_enabled: bool) -> Self {
        Self {
            safe_state: Arc::new(StdMutex::new(GateState::new(
                block_on_newline_enabled,
            ))),
            safe_sink,
        }
    }

    /// Feed one chunk of raw input, or [None] for end of stream. End of stream is
    /// queued behind any pending text, so text that is already queued is delivered
    /// first.
    ///
    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock. To avoid panics, ensure that the code that
    /// locks the mutex does not panic while holding the lock.
    pub fn on_data(&self, maybe_bytes: Option<&[u8]>) {
        let interrupts = {
            let mut state = self.safe_state.lock().unwrap();
            match maybe_bytes {
                Some(bytes) => {
                    let text = state.decoder.decode(bytes);
                    state.enqueue(&text)
                }
                None => {
                    let tail = state.decoder.finish();
                    let interrupts = state.enqueue(&tail);
                    state.queue.push_back(GateToken::End);
                    interrupts
                }
            }
        }; // Drop the state lock.

        DEBUG_INPUT_GATE_MOD.then(|| {
            // % is Display, ? is Debug.
            tracing::debug!(
                message = "InputGate::on_data",
                bytes = ?maybe_bytes,
                interrupts = ?interrupts
            );
        });

        for interrupt in interrupts {
            self.push_now(GateChunk::Data(interrupt.to_string()));
        }

        self.flush();
    }

    /// Re-enable forwarding and flush the queue. Idempotent. Safe to call with nothing
    /// queued, and safe to call from inside [`crate::GateSink::push`].
    ///
    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock. To avoid panics, ensure that the code that
    /// locks the mutex does not panic while holding the lock.
    pub fn next_line(&self) {
        self.safe_state.lock().unwrap().forwarding = true;
        self.flush();
    }

    /// Switch to blocking mode. Does not flush.
    ///
    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock. To avoid panics, ensure that the code that
    /// locks the mutex does not panic while holding the lock.
    pub fn enable_block_on_newline(&self) {
        self.safe_state.lock().unwrap().block_on_newline_enabled = true;
    }

    /// Switch to pass through mode and flush whatever was queued.
    ///
    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock. To avoid panics, ensure that the code that
    /// locks the mutex does not panic while holding the lock.
    pub fn disable_block_on_newline(&self) {
        self.safe_state.lock().unwrap().block_on_newline_enabled = false;
        self.flush();
    }

    /// # Panics
    ///
    /// This will panic if the lock is poisoned.
    #[must_use]
    pub fn is_block_on_newline_enabled(&self) -> bool {
        self.safe_state.lock().unwrap().block_on_newline_enabled
    }

    /// # Panics
    ///
    /// This will panic if the lock is poisoned.
    #[must_use]
    pub fn queued_token_count(&self) -> usize {
        self.safe_state.lock().unwrap().queue.len()
    }

    /// Drain the queue for as long as the sink may receive:
    /// - the queue is not empty,
    /// - forwarding is enabled (or blocking is disabled),
    /// - the sink is not paused,
    /// - no push is in progress.
    ///
    /// A line ending is emitted, but forwarding is switched off before it is, so that
    /// everything after it waits for the next [`InputGate::next_line()`].
    ///
    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock. To avoid panics, ensure that the code that
    /// locks the mutex does not panic while holding the lock.
    pub fn flush(&self) {
        loop {
            // The sink lock is held for the whole push, so it must not be taken from a
            // reentrant call.
            if self.safe_state.lock().unwrap().inside_push > 0 {
                return;
            }

            let sink_is_paused = self.safe_sink.lock().unwrap().is_paused();

            let chunk = {
                let mut state = self.safe_state.lock().unwrap();

                if state.inside_push > 0 {
                    return;
                }

                let chunk = if let Some(urgent) = state.urgent.pop_front() {
                    urgent
                } else {
                    let front_is_end = matches!(state.queue.front(), Some(GateToken::End));
                    if !front_is_end && (sink_is_paused || !state.should_forward()) {
                        return;
                    }
                    let Some(token) = state.queue.pop_front() else {
                        return;
                    };
                    if token.is_line_ending() {
                        state.forwarding = false;
                    }
                    GateChunk::from(token)
                };

                // Claimed under the same lock as the pop, so no other caller can take
                // the next token and push it ahead of this one.
                state.inside_push += 1;
                chunk
            }; // Drop the state lock.

            self.push_to_sink(chunk);
        }
    }

    /// Push an interrupt character straight through. If a push is already in progress
    /// it goes to the urgent queue, and the outer flush delivers it next.
    fn push_now(&self, chunk: GateChunk) {
        {
            let mut state = self.safe_state.lock().unwrap();
            if state.inside_push > 0 {
                state.urgent.push_back(chunk);
                return;
            }
            state.inside_push += 1;
        }
        self.push_to_sink(chunk);
    }

    /// The caller must have incremented `inside_push` in the same locked section in
    /// which it took `chunk`. It is released here once the push is done.
    fn push_to_sink(&self, chunk: GateChunk) {
        self.safe_sink.lock().unwrap().push(chunk);
        self.safe_state.lock().unwrap().inside_push -= 1;
    }
}
