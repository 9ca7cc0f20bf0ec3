// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::Arc;

use crate::{StdMutex, TerminalModeControl};

/// Records every raw mode change, so a test can assert the off / on sequence.
#[derive(Debug)]
pub struct MockTerminalMode {
    pub is_raw: bool,
    pub transitions: Arc<StdMutex<Vec<bool>>>,
}

impl MockTerminalMode {
    pub fn new(initial_raw: bool) -> (Self, Arc<StdMutex<Vec<bool>>>) {
        let transitions = Arc::new(StdMutex::new(vec![]));
        let it = Self {
            is_raw: initial_raw,
            transitions: transitions.clone(),
        };
        (it, transitions)
    }
}

impl TerminalModeControl for MockTerminalMode {
    fn is_raw_mode(&self) -> bool { self.is_raw }

    fn set_raw_mode(&mut self, enabled: bool) -> miette::Result<bool> {
        let previous = self.is_raw;
        self.is_raw = enabled;
        self.transitions.lock().unwrap().push(enabled);
        Ok(previous)
    }
}
