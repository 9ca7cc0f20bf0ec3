// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod keypress_parser;
pub mod keypress_types;

// Re-export.
pub use keypress_parser::*;
pub use keypress_types::*;
