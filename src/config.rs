use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Settings read from `.doctidy.toml`. Every field is optional in the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Documentation file extensions, without the dot
    pub extensions: Vec<String>,
    /// Glob patterns matched against paths relative to the scan root
    pub exclude: Vec<String>,
    /// Directory names never descended into
    pub skip_dirs: Vec<String>,
    /// Pairwise similarity a file must exceed to join a duplicate set
    pub duplicate_threshold: f64,
    pub target_root: PathBuf,
    pub archive_root: PathBuf,
    /// Files modified within this many days get a priority boost
    pub recent_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            extensions: vec!["md".into(), "mdx".into(), "txt".into()],
            exclude: Vec::new(),
            skip_dirs: vec![
                "node_modules".into(),
                ".git".into(),
                ".nuxt".into(),
                "dist".into(),
                "coverage".into(),
            ],
            duplicate_threshold: 0.8,
            target_root: PathBuf::from("docs"),
            archive_root: PathBuf::from("docs/archive"),
            recent_days: 30,
        }
    }
}

impl Config {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Config> {
        match fs::read_to_string(path) {
            Ok(content) => Config::parse(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn parse(content: &str) -> Result<Config> {
        Ok(toml::from_str(content)?)
    }

    pub fn is_doc_file(&self, path: &Path) -> bool {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        self.extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(&ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.duplicate_threshold, 0.8);
        assert!(config.is_doc_file(Path::new("a/README.md")));
        assert!(config.is_doc_file(Path::new("a/page.MDX")));
        assert!(config.is_doc_file(Path::new("notes.txt")));
        assert!(!config.is_doc_file(Path::new("main.rs")));
        assert!(!config.is_doc_file(Path::new("Makefile")));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::parse("duplicate_threshold = 0.9\nexclude = [\"drafts/**\"]\n").unwrap();
        assert_eq!(config.duplicate_threshold, 0.9);
        assert_eq!(config.exclude, vec!["drafts/**".to_string()]);
        assert_eq!(config.target_root, PathBuf::from("docs"));
        assert_eq!(config.recent_days, 30);
    }

    #[test]
    fn test_malformed_file_is_error() {
        assert!(Config::parse("duplicate_threshold = \"high\"").is_err());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join(".doctidy.toml")).unwrap();
        assert_eq!(config.extensions.len(), 3);
    }
}
