// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::{DEBUG_EVAL_SCHEDULER_MOD, StdMutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitEvent;

#[derive(Debug, Default)]
pub struct ExitQueueState {
    pub deferring: bool,
    pub pending: bool,
}

/// Exit requests (`Ctrl+D` on an empty line, end of input) go through this queue. While
/// an evaluation is running they are held, and the [`crate::EvalScheduler`] delivers a
/// single [`ExitEvent`] after the evaluation's [`crate::EvalEvent::Finish`]. So the host
/// never tears down the session under a running evaluation.
///
/// Several requests held during one evaluation are delivered as one event.
#[derive(Debug, Clone)]
pub struct ExitEventQueue {
    pub safe_state: Arc<StdMutex<ExitQueueState>>,
    pub sender: broadcast::Sender<ExitEvent>,
}

impl Default for ExitEventQueue {
    fn default() -> Self { Self::new() }
}

impl ExitEventQueue {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel::<ExitEvent>(1);
        Self {
            safe_state: Arc::new(StdMutex::new(ExitQueueState::default())),
            sender,
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ExitEvent> { self.sender.subscribe() }

    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock.
    pub fn request_exit(&self) {
        {
            let mut state = self.safe_state.lock().unwrap();
            if state.deferring {
                state.pending = true;
                DEBUG_EVAL_SCHEDULER_MOD.then(|| {
                    tracing::debug!(message = "ExitEventQueue -> exit deferred");
                });
                return;
            }
        }
        self.deliver();
    }

    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock.
    pub fn begin_deferral(&self) {
        let mut state = self.safe_state.lock().unwrap();
        state.deferring = true;
        state.pending = false;
    }

    /// Stops holding exit requests. Returns whether one arrived while they were held,
    /// it is up to the caller to [`Self::deliver()`] it.
    ///
    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock.
    pub fn end_deferral(&self) -> bool {
        let mut state = self.safe_state.lock().unwrap();
        state.deferring = false;
        std::mem::take(&mut state.pending)
    }

    /// # Panics
    ///
    /// This will panic if the lock is poisoned, which can happen if a thread
    /// panics while holding the lock.
    #[must_use]
    pub fn is_deferring(&self) -> bool { self.safe_state.lock().unwrap().deferring }

    pub fn deliver(&self) {
        // No subscribers just means nobody cares about exiting.
        self.sender.send(ExitEvent).ok();
    }
}
