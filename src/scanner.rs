use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::Result;
use crate::migrate::is_backup_dir_name;
use crate::model::FileRecord;

fn build_excludes(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

fn read_record(path: &Path, rel_path: &Path) -> std::io::Result<FileRecord> {
    let metadata = fs::metadata(path)?;
    let bytes = fs::read(path)?;
    let content = match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(e) => {
            debug!(path = %path.display(), "invalid UTF-8, decoding lossily");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };

    Ok(FileRecord::new(path, content, metadata.modified()?)
        .with_rel_path(rel_path)
        .with_size(metadata.len()))
}

/// Collect every documentation file under `root`.
///
/// Directories named in `skip_dirs` are pruned, along with the archive root
/// and any `<dir>-backup-<timestamp>` tree left by a migration. `exclude`
/// globs are matched against the path relative to `root`. Hidden and
/// gitignored files are scanned like any other. Unreadable entries are
/// logged and skipped; invalid UTF-8 is decoded with replacement characters.
/// Records come back sorted by path.
pub fn scan_directory(root: &Path, config: &Config) -> Result<Vec<FileRecord>> {
    let root = root.canonicalize()?;
    let excludes = build_excludes(&config.exclude)?;
    let skip_dirs = config.skip_dirs.clone();
    let archive_root = config.archive_root.canonicalize().ok();

    let mut builder = WalkBuilder::new(&root);
    builder
        .standard_filters(false)
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir || entry.depth() == 0 {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            let skipped = skip_dirs.iter().any(|d| name == d.as_str())
                || is_backup_dir_name(&name)
                || archive_root.as_deref() == Some(entry.path());
            !skipped
        });

    let mut records = Vec::new();

    for entry in builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable path during scan");
                continue;
            }
        };

        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }

        let path = entry.path();
        if !config.is_doc_file(path) {
            continue;
        }

        let rel_path: PathBuf = path.strip_prefix(&root).unwrap_or(path).to_path_buf();
        if excludes.is_match(&rel_path) {
            debug!(path = %rel_path.display(), "excluded by pattern");
            continue;
        }

        match read_record(path, &rel_path) {
            Ok(record) => records.push(record),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable file"),
        }
    }

    records.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(root = %root.display(), files = records.len(), "scan complete");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_scan_filters_extensions_and_skip_dirs() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "README.md", "# Readme");
        write(dir.path(), "guides/setup.mdx", "# Setup");
        write(dir.path(), "notes.txt", "plain");
        write(dir.path(), "src/main.rs", "fn main() {}");
        write(dir.path(), "node_modules/pkg/README.md", "# Vendored");
        write(dir.path(), "dist/out.md", "# Built");

        let records = scan_directory(dir.path(), &Config::default()).unwrap();
        let rel: Vec<String> = records
            .iter()
            .map(|r| r.rel_path.to_string_lossy().replace('\\', "/"))
            .collect();

        assert_eq!(rel, vec!["README.md", "guides/setup.mdx", "notes.txt"]);
        assert!(records.iter().all(|r| r.path.is_absolute()));
        assert_eq!(records[0].size, 8);
        assert_eq!(records[0].content, "# Readme");
    }

    #[test]
    fn test_scan_applies_exclude_globs() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "drafts/wip.md", "# WIP");
        write(dir.path(), "docs/final.md", "# Final");

        let config = Config {
            exclude: vec!["drafts/**".into()],
            ..Config::default()
        };
        let records = scan_directory(dir.path(), &config).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "final.md");
    }

    #[test]
    fn test_scan_includes_hidden_and_gitignored_docs() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ".github/CONTRIBUTING.md", "# Contributing");
        write(dir.path(), ".gitignore", "generated/\n");
        write(dir.path(), "generated/api.md", "# API");
        write(dir.path(), ".git/HEAD.md", "not docs");

        let records = scan_directory(dir.path(), &Config::default()).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["CONTRIBUTING.md", "api.md"]);
    }

    #[test]
    fn test_scan_skips_backups_and_archive_root() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "docs/tutorials/intro.md", "# Intro");
        write(dir.path(), "docs-backup-2026-10-18T21-49-31.191/tutorials/intro.md", "# Intro");
        write(dir.path(), "docs/archive/2026-10-18/old.md", "# Old");

        let config = Config {
            archive_root: dir.path().join("docs/archive"),
            ..Config::default()
        };
        let records = scan_directory(dir.path(), &config).unwrap();
        let rel: Vec<String> = records
            .iter()
            .map(|r| r.rel_path.to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(rel, vec!["docs/tutorials/intro.md"]);
    }

    #[test]
    fn test_scan_keeps_invalid_utf8_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("latin1.md"), b"# Caf\xe9\n").unwrap();

        let records = scan_directory(dir.path(), &Config::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, "# Caf\u{FFFD}\n");
        assert_eq!(records[0].size, 7);
    }

    #[test]
    fn test_scan_bad_glob_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            exclude: vec!["[".into()],
            ..Config::default()
        };
        assert!(scan_directory(dir.path(), &config).is_err());
    }

    #[test]
    fn test_scan_missing_root_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan_directory(&dir.path().join("nope"), &Config::default()).is_err());
    }
}
