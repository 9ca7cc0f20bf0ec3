// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{collections::VecDeque, fs, path::Path};

use miette::{IntoDiagnostic, WrapErr};

use crate::{DEBUG_HISTORY_MOD, History};

/// One entry per line, newest first. A missing file is an empty history.
///
/// # Errors
///
/// If the file exists but can't be read.
pub fn try_load_history(path: &Path, max_size: usize) -> miette::Result<History> {
    let mut history = History::new(max_size);
    if !path.exists() {
        return Ok(history);
    }

    let content = fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Could not read history file {}", path.display()))?;

    let entries: VecDeque<String> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(ToString::to_string)
        .collect();
    history.replace_entries(entries);

    // % is Display, ? is Debug.
    DEBUG_HISTORY_MOD.then(|| {
        tracing::debug!(
            message = "Loaded history",
            path = ?path,
            entries = history.entries.len()
        );
    });

    Ok(history)
}

/// Creates the parent folder if needed.
///
/// # Errors
///
/// If the folder can't be created or the file can't be written.
pub fn try_save_history(path: &Path, history: &History) -> miette::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .into_diagnostic()
            .wrap_err_with(|| format!("Could not create folder {}", parent.display()))?;
    }

    let mut content = history
        .entries
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n");
    content.push('\n');

    fs::write(path, content)
        .into_diagnostic()
        .wrap_err_with(|| format!("Could not write history file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_file_is_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let history = try_load_history(&dir.path().join("nope"), 10).unwrap();
        assert!(history.entries.is_empty());
        assert_eq!(history.max_size, 10);
    }

    #[test]
    fn test_save_then_load_keeps_order_and_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history");

        let mut history = History::new(10);
        history.update(Some("oldest".into()));
        history.update(Some("middle".into()));
        history.update(Some("newest".into()));
        try_save_history(&path, &history).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "newest\nmiddle\noldest\n"
        );

        let loaded = try_load_history(&path, 2).unwrap();
        assert_eq!(
            loaded.entries,
            VecDeque::from(vec!["newest".to_string(), "middle".to_string()])
        );
    }
}
