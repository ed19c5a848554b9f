use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Tunables for the load pipeline, persisted as TOML alongside the viewer's
/// other preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoaderSettings {
    /// Use the fork-join parallel sort for large files.
    pub parallel_sort: bool,
    /// Corner count at which the parallel sort kicks in.
    pub parallel_threshold: usize,
    /// Cap on sort worker threads; 0 means use hardware concurrency.
    pub max_sort_threads: usize,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            parallel_sort: true,
            parallel_threshold: 100_000,
            max_sort_threads: 0,
        }
    }
}

impl LoaderSettings {
    pub fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let settings: LoaderSettings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from a file, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from_file(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("failed to load loader settings from {path:?}: {e}");
                Self::default()
            }
        }
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string(self)?;
        let mut file = fs::File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = LoaderSettings::default();
        assert!(settings.parallel_sort);
        assert_eq!(settings.parallel_threshold, 100_000);
        assert_eq!(settings.max_sort_threads, 0);
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loader.toml");

        let mut settings = LoaderSettings::default();
        settings.parallel_threshold = 5_000;
        settings.max_sort_threads = 4;
        settings.save_to_file(&path).unwrap();

        let loaded = LoaderSettings::load_from_file(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_load_or_default_on_missing_file() {
        let settings = LoaderSettings::load_or_default(Path::new("does/not/exist.toml"));
        assert_eq!(settings, LoaderSettings::default());
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let settings: LoaderSettings = toml::from_str("parallel_sort = false\n").unwrap();
        assert!(!settings.parallel_sort);
        assert_eq!(settings.parallel_threshold, 100_000);
    }
}
