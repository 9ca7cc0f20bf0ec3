// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::sync::LazyLock;

use regex::Regex;

use crate::{DEBUG_HISTORY_MOD, History};

/// Commands that carry credentials. They are never kept in the history.
static SENSITIVE_COMMAND_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(createUser|updateUser|changeUserPassword|auth|connect|Mongo)\s*\(")
        .expect("Invalid sensitive command regex")
});

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\w.+-]+@[\w-]+(\.[\w-]+)+").expect("Invalid email regex")
});

/// `scheme://user:password@` in a connection string.
static URL_CREDENTIALS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z][A-Za-z0-9+.-]*://)[^\s/@]+@")
        .expect("Invalid url credentials regex")
});

pub const REDACTED_EMAIL: &str = "<email>";
pub const REDACTED_CREDENTIALS: &str = "<credentials>";

/// Runs after every history change, looking only at the newest entry:
/// 1. A sensitive command is removed.
/// 2. Otherwise, if `redact_info` is set, e-mail addresses and connection string
///    credentials are replaced with placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistorySanitizer {
    pub redact_info: bool,
}

impl HistorySanitizer {
    #[must_use]
    pub fn new(redact_info: bool) -> Self { Self { redact_info } }

    pub fn sanitize(&self, history: &mut History) {
        let Some(newest) = history.entries.front() else {
            return;
        };

        if is_sensitive_command(newest) {
            history.entries.pop_front();
            history.reset_position();
            DEBUG_HISTORY_MOD.then(|| {
                tracing::debug!(message = "HistorySanitizer -> removed sensitive entry");
            });
            return;
        }

        if self.redact_info {
            let redacted = redact_info(newest);
            if let Some(front) = history.entries.front_mut() {
                *front = redacted;
            }
        }
    }
}

#[must_use]
pub fn is_sensitive_command(line: &str) -> bool { SENSITIVE_COMMAND_REGEX.is_match(line) }

#[must_use]
pub fn redact_info(line: &str) -> String {
    let without_credentials =
        URL_CREDENTIALS_REGEX.replace_all(line, format!("${{1}}{REDACTED_CREDENTIALS}@"));
    EMAIL_REGEX
        .replace_all(&without_credentials, REDACTED_EMAIL)
        .into_owned()
}
