// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod incomplete_input;

// Re-export.
pub use incomplete_input::*;
