// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod editor_core;
pub mod emacs_key_handler;
pub mod line_editor_hooks;
pub mod line_editor_impl;

// Re-export.
pub use editor_core::*;
pub use emacs_key_handler::*;
pub use line_editor_hooks::*;
pub use line_editor_impl::*;
