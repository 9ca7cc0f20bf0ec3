// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach.
pub mod async_input_stream_mock;
pub mod fake_line_editor_hooks;
pub mod mock_terminal_mode;
pub mod output_device_ext;
pub mod scripted_evaluator;
pub mod stdout_mock;

// Re-export.
pub use async_input_stream_mock::*;
pub use fake_line_editor_hooks::*;
pub use mock_terminal_mode::*;
pub use output_device_ext::*;
pub use scripted_evaluator::*;
pub use stdout_mock::*;
