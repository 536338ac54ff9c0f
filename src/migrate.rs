use chrono::{NaiveDate, Utc};
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::SystemTime;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::markdown;
use crate::model::{Category, FileRecord};
use crate::planner::numbered_variant;

/// One file move, as handed to [`migrate_file`].
#[derive(Debug, Clone)]
pub struct MigrationRequest {
    pub old_path: PathBuf,
    pub new_path: PathBuf,
    pub category: Category,
    pub adapt_content: bool,
}

#[derive(Serialize, Debug, Clone)]
pub struct MigrationResult {
    pub success: bool,
    pub old_path: PathBuf,
    pub new_path: PathBuf,
    pub links_updated: usize,
    pub errors: Vec<String>,
}

impl MigrationResult {
    fn failed(request: &MigrationRequest, error: String) -> Self {
        MigrationResult {
            success: false,
            old_path: request.old_path.clone(),
            new_path: request.new_path.clone(),
            links_updated: 0,
            errors: vec![error],
        }
    }
}

/// Subdirectories of the target layout, relative to its root.
const STRUCTURE: &[&str] = &[
    "tutorials",
    "how-to",
    "how-to/authentication",
    "how-to/checkout",
    "how-to/deployment",
    "how-to/testing",
    "reference",
    "reference/api",
    "reference/architecture",
    "reference/configuration",
    "reference/components",
    "explanation",
    "explanation/architecture",
    "explanation/decisions",
    "explanation/concepts",
    "project",
    "archive",
    "ai-context",
];

/// Create the conventional documentation layout under `target_root`.
pub fn create_structure(target_root: &Path) -> Result<()> {
    fs::create_dir_all(target_root)?;
    for dir in STRUCTURE {
        fs::create_dir_all(target_root.join(dir))?;
    }
    Ok(())
}

pub(crate) fn set_mtime(path: &Path, modified: SystemTime) -> Result<()> {
    fs::File::options().write(true).open(path)?.set_modified(modified)?;
    Ok(())
}

fn copy_with_mtime(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to)?;
    set_mtime(to, fs::metadata(from)?.modified()?)
}

fn write_migrated(request: &MigrationRequest) -> Result<()> {
    let content = fs::read_to_string(&request.old_path)?;
    let content = if request.adapt_content {
        adapt_content_to_category(&content, request.category)
    } else {
        content
    };

    if let Some(parent) = request.new_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&request.new_path, content)?;

    set_mtime(&request.new_path, fs::metadata(&request.old_path)?.modified()?)
}

/// Copy one file to its new location, optionally adapting it to its category.
///
/// Never overwrites: a missing source or an existing target is reported in
/// the result rather than raised.
pub fn migrate_file(request: &MigrationRequest) -> MigrationResult {
    if !request.old_path.exists() {
        return MigrationResult::failed(
            request,
            format!("Source file does not exist: {}", request.old_path.display()),
        );
    }
    if request.new_path.exists() {
        return MigrationResult::failed(
            request,
            format!("Target file already exists: {}", request.new_path.display()),
        );
    }

    match write_migrated(request) {
        Ok(()) => {
            debug!(from = %request.old_path.display(), to = %request.new_path.display(), "migrated");
            MigrationResult {
                success: true,
                old_path: request.old_path.clone(),
                new_path: request.new_path.clone(),
                links_updated: 0,
                errors: Vec::new(),
            }
        }
        Err(e) => MigrationResult::failed(request, e.to_string()),
    }
}

const LEARN_STUB: &str = "## What You Will Learn\n\nIn this tutorial, you will learn:\n\n- [Add learning objectives here]\n\n";
const TUTORIAL_PREREQ_STUB: &str =
    "## Prerequisites\n\nBefore starting this tutorial, you should have:\n\n- [Add prerequisites here]\n\n";
const PREREQ_STUB: &str = "## Prerequisites\n\n- [Add prerequisites here]\n\n";
const STEPS_STUB: &str = "## Steps\n\n";
const OVERVIEW_STUB: &str = "## Overview\n\n[Add high-level overview here]\n\n";

fn required_sections(category: Category) -> &'static [(&'static str, &'static str)] {
    match category {
        Category::Tutorial => &[
            ("## what you will learn", LEARN_STUB),
            ("## prerequisites", TUTORIAL_PREREQ_STUB),
        ],
        Category::HowTo => &[("## prerequisites", PREREQ_STUB), ("## steps", STEPS_STUB)],
        Category::Explanation => &[("## overview", OVERVIEW_STUB)],
        _ => &[],
    }
}

/// Add the stub sections a category expects when they are missing.
///
/// Stubs go right after the `# ` title (or after frontmatter, or at the top);
/// the rest of the text is untouched, so adapting twice changes nothing.
pub fn adapt_content_to_category(content: &str, category: Category) -> String {
    let lower = content.to_lowercase();
    let stubs: String = required_sections(category)
        .iter()
        .filter(|(heading, _)| !lower.contains(heading))
        .map(|(_, stub)| *stub)
        .collect();

    if stubs.is_empty() {
        return content.to_string();
    }

    match markdown::title_line_end(content) {
        Some(end) if content[..end].ends_with('\n') => {
            format!("{}\n{}{}", &content[..end], stubs, &content[end..])
        }
        Some(end) => format!("{}\n\n{}{}", &content[..end], stubs, &content[end..]),
        None => {
            let at = markdown::frontmatter(content).map(|(_, end)| end).unwrap_or(0);
            format!("{}{}{}", &content[..at], stubs, &content[at..])
        }
    }
}

/// Copy `path` into `archive_root/<date>/`, adding `-1`, `-2`, ... on name clashes.
/// The source is left in place.
pub fn archive_file_on(path: &Path, archive_root: &Path, date: NaiveDate) -> Result<PathBuf> {
    let archive_dir = archive_root.join(date.format("%Y-%m-%d").to_string());
    fs::create_dir_all(&archive_dir)?;

    let file_name = path.file_name().ok_or_else(|| Error::InvalidPath(path.to_path_buf()))?;
    let base = archive_dir.join(file_name);

    let mut target = base.clone();
    let mut counter = 1;
    while target.exists() {
        target = numbered_variant(&base, counter);
        counter += 1;
    }

    copy_with_mtime(path, &target)?;
    info!(from = %path.display(), to = %target.display(), "archived");
    Ok(target)
}

pub fn archive_file(path: &Path, archive_root: &Path) -> Result<PathBuf> {
    archive_file_on(path, archive_root, Utc::now().date_naive())
}

/// Keep the most recent record (larger size breaks ties) and archive the rest.
/// Returns the keeper's path, which is never moved.
pub fn consolidate_duplicates(records: &[&FileRecord], archive_root: &Path) -> Result<PathBuf> {
    let first = records.first().ok_or(Error::NothingToConsolidate)?;
    if records.len() == 1 {
        return Ok(first.path.clone());
    }

    let best = records.iter().skip(1).fold(*first, |best, &file| {
        if file.modified > best.modified || (file.modified == best.modified && file.size > best.size) {
            file
        } else {
            best
        }
    });

    for file in records {
        if file.path != best.path {
            archive_file(&file.path, archive_root)?;
        }
    }

    Ok(best.path.clone())
}

fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        let rel = entry
            .path()
            .strip_prefix(from)
            .map_err(|_| Error::InvalidPath(entry.path().to_path_buf()))?;
        let dest = to.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest)?;
        } else if entry.file_type().is_file() {
            copy_with_mtime(entry.path(), &dest)?;
        }
    }
    Ok(())
}

static BACKUP_DIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-backup-\d{4}-\d{2}-\d{2}T\d{2}-\d{2}-\d{2}(\.\d+)?$").expect("backup dir pattern")
});

/// Whether a directory name looks like one written by [`create_backup`].
pub fn is_backup_dir_name(name: &str) -> bool {
    BACKUP_DIR_RE.is_match(name)
}

/// Copy `dir` to a sibling `<dir>-backup-<timestamp>` directory.
pub fn create_backup(dir: &Path) -> Result<PathBuf> {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| Error::InvalidPath(dir.to_path_buf()))?;
    let stamp = Utc::now().format("%Y-%m-%dT%H-%M-%S%.3f");
    let backup = dir.with_file_name(format!("{name}-backup-{stamp}"));

    copy_tree(dir, &backup)?;
    info!(backup = %backup.display(), "backup created");
    Ok(backup)
}

/// Replace `dir` with the contents of `backup`.
pub fn restore_backup(backup: &Path, dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    copy_tree(backup, dir)?;
    info!(from = %backup.display(), to = %dir.display(), "restored backup");
    Ok(())
}
