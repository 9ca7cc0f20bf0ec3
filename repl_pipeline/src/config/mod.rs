// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach sources.
pub mod config_folder;
pub mod repl_config;

// Re-export.
pub use config_folder::*;
pub use repl_config::*;
