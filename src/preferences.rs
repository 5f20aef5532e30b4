use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::configuration_directory;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Preferences {
    #[serde(default)]
    pub language: Option<String>,
}

impl Preferences {
    pub fn file_path() -> PathBuf {
        configuration_directory().join("preferences.toml")
    }

    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(preferences) => {
                    log::info!("[preferences] loaded from {}", path.display());
                    preferences
                }
                Err(error) => {
                    log::warn!("[preferences] failed to parse {}: {error}", path.display());
                    Self::default()
                }
            },
            Err(_) => {
                log::info!(
                    "[preferences] no preferences at {}, using defaults",
                    path.display()
                );
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) {
        if let Some(parent) = path.parent()
            && let Err(error) = std::fs::create_dir_all(parent)
        {
            log::warn!(
                "[preferences] failed to create directory {}: {error}",
                parent.display()
            );
        }
        match toml::to_string_pretty(self) {
            Ok(content) => {
                if let Err(error) = std::fs::write(path, content) {
                    log::warn!("[preferences] failed to write {}: {error}", path.display());
                }
            }
            Err(error) => {
                log::warn!("[preferences] failed to serialize preferences: {error}");
            }
        }
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn set_language(&mut self, code: &str) {
        self.language = Some(code.to_string());
    }
}
