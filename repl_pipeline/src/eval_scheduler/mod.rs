// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod eval_scheduler_impl;
pub mod eval_types;
pub mod exit_event_queue;
pub mod interrupt_notifier;
pub mod repl_eval_error;
pub mod terminal_mode;

// Re-export.
pub use eval_scheduler_impl::*;
pub use eval_types::*;
pub use exit_event_queue::*;
pub use interrupt_notifier::*;
pub use repl_eval_error::*;
pub use terminal_mode::*;
