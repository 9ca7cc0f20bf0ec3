// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod history_buffer;
pub mod history_coalescer;
pub mod history_file;
pub mod history_sanitizer;

// Re-export.
pub use history_buffer::*;
pub use history_coalescer::*;
pub use history_file::*;
pub use history_sanitizer::*;
