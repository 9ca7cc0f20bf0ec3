// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::collections::VecDeque;

use crate::HISTORY_SIZE_MAX;

/// Newest entry first. The line editor adds each submitted line with
/// [`Self::update()`], and browses with [`Self::search_next()`] (older) and
/// [`Self::search_previous()`] (newer).
#[derive(Debug, Clone)]
pub struct History {
    pub entries: VecDeque<String>,
    pub max_size: usize,
    current_position: Option<usize>,
}

impl Default for History {
    fn default() -> Self { Self::new(HISTORY_SIZE_MAX) }
}

impl History {
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::default(),
            max_size,
            current_position: Option::default(),
        }
    }
}

impl History {
    // Update history entries
    pub fn update(&mut self, maybe_line: Option<String>) {
        // Receive a new line.
        if let Some(line) = maybe_line {
            // Don't add entry if last entry was same, or line was empty.
            if self.entries.front() == Some(&line) || line.is_empty() {
                return;
            }
            // Add entry to front of history.
            self.entries.push_front(line);

            // Reset offset to newest entry.
            self.current_position = None;

            // Check if already have enough entries.
            if self.entries.len() > self.max_size {
                // Remove oldest entry
                self.entries.pop_back();
            }
        }
    }

    /// Swap in a whole new list, newest first. Used when several entries are merged
    /// into one.
    pub fn replace_entries(&mut self, mut entries: VecDeque<String>) {
        entries.truncate(self.max_size);
        self.entries = entries;
        self.current_position = None;
    }

    pub fn reset_position(&mut self) { self.current_position = None; }

    // Find next history that matches a given string from an index.
    pub fn search_next(&mut self) -> Option<&str> {
        if let Some(index) = &mut self.current_position {
            if *index < self.entries.len() - 1 {
                *index += 1;
            }
            Some(&self.entries[*index])
        } else if !self.entries.is_empty() {
            self.current_position = Some(0);
            Some(&self.entries[0])
        } else {
            None
        }
    }

    // Find previous history item that matches a given string from an index.
    pub fn search_previous(&mut self) -> Option<&str> {
        if let Some(index) = &mut self.current_position {
            if *index == 0 {
                self.current_position = None;
                return Some("");
            }
            *index -= 1;
            Some(&self.entries[*index])
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update() {
        let mut history = History::new(2);
        history.update(Some("test1".into()));
        assert_eq!(history.entries.front(), Some(&"test1".to_string()));

        history.update(None);
        assert_eq!(history.entries.front(), Some(&"test1".to_string()));

        history.update(Some("test1".into()));
        assert_eq!(history.entries.front(), Some(&"test1".to_string()));

        history.update(Some("test2".into()));
        assert_eq!(history.entries.front(), Some(&"test2".to_string()));

        assert_eq!(history.entries.len(), 2);

        history.update(Some("test3".into()));
        assert_eq!(history.entries.len(), 2);
        assert!(history.entries.contains(&"test2".to_string()));
        assert!(history.entries.contains(&"test3".to_string()));
    }

    #[test]
    fn test_search_next() {
        let mut history = History::new(2);
        history.update(Some("test1".into()));
        history.update(Some("test2".into()));
        history.update(Some("test3".into()));

        assert_eq!(history.search_next(), Some("test3"));
        assert_eq!(history.search_next(), Some("test2"));
        assert_eq!(history.search_next(), Some("test2"));
    }

    #[test]
    fn test_search_previous() {
        let mut history = History::new(2);
        history.update(Some("test1".into()));
        history.update(Some("test2".into()));
        history.update(Some("test3".into()));

        assert_eq!(history.search_previous(), None);
        assert_eq!(history.search_next(), Some("test3"));
        assert_eq!(history.search_previous(), Some(""));
        assert_eq!(history.search_previous(), None);
    }

    #[test]
    fn test_replace_entries_truncates_and_resets_position() {
        let mut history = History::new(2);
        history.update(Some("a".into()));
        assert_eq!(history.search_next(), Some("a"));

        history.replace_entries(VecDeque::from(vec![
            "x".to_string(),
            "y".to_string(),
            "z".to_string(),
        ]));
        assert_eq!(history.entries, VecDeque::from(vec!["x".to_string(), "y".to_string()]));
        assert_eq!(history.search_previous(), None);
    }
}
