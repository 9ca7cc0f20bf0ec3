// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod gate_types;
pub mod input_gate_impl;
pub mod utf8_stream_decoder;

// Re-export.
pub use gate_types::*;
pub use input_gate_impl::*;
pub use utf8_stream_decoder::*;
