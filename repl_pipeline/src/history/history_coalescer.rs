// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::collections::VecDeque;

use crate::{DEBUG_HISTORY_MOD, EvalEvent, EvalEventListener, HistorySanitizer,
            SafeHistory};

/// Collapses the history entries left behind by a multi-line input into one entry.
///
/// Each line the user submits is added to the history by the line editor as soon as it
/// is typed. While the accumulated input stays incomplete the evaluations finish as
/// recoverable. So for:
///
/// ```text
/// > foo(     -> recoverable
/// ... 1,     -> recoverable
/// ... 2)     -> complete
/// ```
///
/// the history holds `2)`, `1,`, `foo(` (newest first), and this listener replaces
/// all three with the single entry `foo( 1, 2)`.
///
/// # Algorithm
///
/// - On the first recoverable finish, take a snapshot of the history minus its newest
///   entry (the line that was just added).
/// - On the next non recoverable finish, if there is a snapshot, flatten the whole
///   input to one line, put it in front of the snapshot, make that the history, and
///   drop the snapshot.
///
/// The [`HistorySanitizer`] runs after every finish, coalesced or not.
#[allow(missing_debug_implementations)]
pub struct HistoryCoalescer {
    pub safe_history: SafeHistory,
    pub maybe_snapshot: Option<VecDeque<String>>,
    pub sanitizer: HistorySanitizer,
}

impl HistoryCoalescer {
    #[must_use]
    pub fn new(safe_history: SafeHistory, sanitizer: HistorySanitizer) -> Self {
        Self {
            safe_history,
            maybe_snapshot: None,
            sanitizer,
        }
    }
}

impl EvalEventListener for HistoryCoalescer {
    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock.
    fn on_eval_event(&mut self, event: &EvalEvent) -> miette::Result<()> {
        let EvalEvent::Finish { input, outcome } = event else {
            return Ok(());
        };

        let mut history = self.safe_history.lock().unwrap();

        if outcome.is_recoverable() {
            if self.maybe_snapshot.is_none() {
                self.maybe_snapshot = Some(history.entries.iter().skip(1).cloned().collect());
            }
        } else if let Some(mut snapshot) = self.maybe_snapshot.take() {
            let flattened = flatten_to_one_line(input);
            // % is Display, ? is Debug.
            DEBUG_HISTORY_MOD.then(|| {
                tracing::debug!(
                    message = "HistoryCoalescer -> coalesced",
                    entry = ?flattened
                );
            });
            if !flattened.is_empty() {
                snapshot.push_front(flattened);
            }
            history.replace_entries(snapshot);
        }

        self.sanitizer.sanitize(&mut history);

        Ok(())
    }
}

/// Every run of line breaks becomes one space, and each line is trimmed.
#[must_use]
pub fn flatten_to_one_line(input: &str) -> String {
    input
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
