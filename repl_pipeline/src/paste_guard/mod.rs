// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod paste_filter;
pub mod paste_guard_impl;

// Re-export.
pub use paste_filter::*;
pub use paste_guard_impl::*;
