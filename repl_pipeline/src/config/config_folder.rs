// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{fmt::{Display, Formatter, Result},
          path::PathBuf};

use dirs::config_dir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPaths {
    R3BLTopLevelFolderName,
    ConfigFile,
    HistoryFile,
}

impl Display for ConfigPaths {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let path = match self {
            ConfigPaths::R3BLTopLevelFolderName => "r3bl-repl",
            ConfigPaths::ConfigFile => "config.json",
            ConfigPaths::HistoryFile => "history",
        };
        write!(f, "{path}")
    }
}

/// This is where the config folder is, eg: `~/.config/r3bl-repl` on Linux.
#[must_use]
pub fn try_get_config_folder_path() -> Option<PathBuf> {
    let home_config_folder_path = config_dir()?;
    Some(home_config_folder_path.join(ConfigPaths::R3BLTopLevelFolderName.to_string()))
}

#[must_use]
pub fn try_get_config_file_path() -> Option<PathBuf> {
    Some(try_get_config_folder_path()?.join(ConfigPaths::ConfigFile.to_string()))
}

#[must_use]
pub fn try_get_history_file_path() -> Option<PathBuf> {
    Some(try_get_config_folder_path()?.join(ConfigPaths::HistoryFile.to_string()))
}
