// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod arithmetic_evaluator_impl;
pub mod arithmetic_parser;

// Re-export.
pub use arithmetic_evaluator_impl::*;
pub use arithmetic_parser::*;
