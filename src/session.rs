use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::migrate::{self, MigrationRequest, MigrationResult};
use crate::planner::MigrationMapping;
use crate::rewrite::{self, LinkMap};

/// Outcome of one [`MigrationSession::run`].
#[derive(Serialize, Debug, Clone)]
pub struct MigrationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub links_updated: usize,
    pub backup: Option<PathBuf>,
    pub results: Vec<MigrationResult>,
    pub errors: Vec<String>,
}

impl MigrationReport {
    pub fn write_json(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Runs a migration plan against the filesystem.
///
/// Files are processed best-effort: a failure is recorded on that file's
/// result and the rest of the plan still runs. Sources are copied, never
/// removed, so a backup of the target tree is enough to roll back.
#[derive(Debug, Clone)]
pub struct MigrationSession {
    target_root: PathBuf,
    dry_run: bool,
    backup: bool,
    adapt_content: bool,
}

impl MigrationSession {
    pub fn new(target_root: impl Into<PathBuf>) -> Self {
        MigrationSession {
            target_root: target_root.into(),
            dry_run: false,
            backup: true,
            adapt_content: true,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    pub fn adapt_content(mut self, adapt: bool) -> Self {
        self.adapt_content = adapt;
        self
    }

    fn request(&self, mapping: &MigrationMapping) -> MigrationRequest {
        MigrationRequest {
            old_path: mapping.old_path.clone(),
            new_path: mapping.new_path.clone(),
            category: mapping.category,
            adapt_content: self.adapt_content,
        }
    }

    /// Execute `plan`. Only backup and scaffolding failures abort the run.
    pub fn run(&self, plan: &[MigrationMapping]) -> Result<MigrationReport> {
        let started_at = Utc::now();
        let plan = absolute_plan(plan)?;
        info!(files = plan.len(), dry_run = self.dry_run, "starting migration");

        let mut backup = None;
        let results = if self.dry_run {
            plan.iter().map(|m| preview(&self.request(m))).collect()
        } else {
            if self.backup && self.target_root.exists() {
                backup = Some(migrate::create_backup(&self.target_root)?);
            }
            migrate::create_structure(&self.target_root)?;

            let mut results: Vec<MigrationResult> = plan
                .iter()
                .map(|m| {
                    let result = migrate::migrate_file(&self.request(m));
                    if !result.success {
                        warn!(file = %m.old_path.display(), errors = ?result.errors, "migration failed");
                    }
                    result
                })
                .collect();

            let map = rewrite::link_map(&plan);
            for result in results.iter_mut().filter(|r| r.success) {
                match rewrite_migrated(result, &map) {
                    Ok(count) => result.links_updated = count,
                    Err(e) => {
                        warn!(file = %result.new_path.display(), error = %e, "link rewrite failed");
                        result.errors.push(format!("Link rewrite failed: {e}"));
                    }
                }
            }
            results
        };

        let succeeded = results.iter().filter(|r| r.success).count();
        let errors: Vec<String> = results.iter().flat_map(|r| r.errors.iter().cloned()).collect();
        let report = MigrationReport {
            started_at,
            finished_at: Utc::now(),
            dry_run: self.dry_run,
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            links_updated: results.iter().map(|r| r.links_updated).sum(),
            backup,
            results,
            errors,
        };

        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            links_updated = report.links_updated,
            "migration finished"
        );
        Ok(report)
    }
}

fn absolute_plan(plan: &[MigrationMapping]) -> Result<Vec<MigrationMapping>> {
    plan.iter()
        .map(|m| {
            Ok(MigrationMapping {
                old_path: std::path::absolute(&m.old_path)?,
                new_path: std::path::absolute(&m.new_path)?,
                ..m.clone()
            })
        })
        .collect()
}

/// What `migrate_file` would report, without touching the filesystem.
fn preview(request: &MigrationRequest) -> MigrationResult {
    let mut errors = Vec::new();
    if !request.old_path.exists() {
        errors.push(format!("Source file does not exist: {}", request.old_path.display()));
    } else if request.new_path.exists() {
        errors.push(format!("Target file already exists: {}", request.new_path.display()));
    }

    MigrationResult {
        success: errors.is_empty(),
        old_path: request.old_path.clone(),
        new_path: request.new_path.clone(),
        links_updated: 0,
        errors,
    }
}

/// Point the links of a freshly migrated file at their new targets, keeping its mtime.
fn rewrite_migrated(result: &MigrationResult, map: &LinkMap) -> Result<usize> {
    let content = fs::read_to_string(&result.new_path)?;
    let (updated, count) = rewrite::rewrite_links(&content, map, &result.old_path, &result.new_path);

    if count > 0 {
        let modified = fs::metadata(&result.new_path)?.modified()?;
        fs::write(&result.new_path, updated)?;
        migrate::set_mtime(&result.new_path, modified)?;
        debug!(file = %result.new_path.display(), links = count, "rewrote links");
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;
    use crate::planner::Effort;

    fn mapping(old: &Path, new: &Path, category: Category) -> MigrationMapping {
        MigrationMapping {
            old_path: old.to_path_buf(),
            new_path: new.to_path_buf(),
            category,
            priority: 5,
            estimated_effort: Effort::Low,
        }
    }

    #[test]
    fn test_run_migrates_and_rewrites_links() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let docs = dir.path().join("docs");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("index.md"), "# Index\n\nSee [setup](setup.md#install).\n").unwrap();
        fs::write(src.join("setup.md"), "# Setup\n").unwrap();

        let plan = vec![
            mapping(&src.join("index.md"), &docs.join("project/index.md"), Category::Project),
            mapping(&src.join("setup.md"), &docs.join("how-to/general/setup.md"), Category::HowTo),
        ];

        let report = MigrationSession::new(&docs).backup(false).adapt_content(false).run(&plan).unwrap();
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(report.links_updated, 1);
        assert!(report.backup.is_none());
        assert_eq!(
            fs::read_to_string(docs.join("project/index.md")).unwrap(),
            "# Index\n\nSee [setup](../how-to/general/setup.md#install).\n"
        );
        assert!(src.join("index.md").exists());
        assert!(docs.join("ai-context").is_dir());
    }

    #[test]
    fn test_failures_do_not_stop_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("docs");
        let present = dir.path().join("present.md");
        fs::write(&present, "# Present\n").unwrap();

        let plan = vec![
            mapping(&dir.path().join("missing.md"), &docs.join("tutorials/missing.md"), Category::Tutorial),
            mapping(&present, &docs.join("tutorials/present.md"), Category::Tutorial),
        ];

        let report = MigrationSession::new(&docs).backup(false).run(&plan).unwrap();
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(fs::read_to_string(docs.join("tutorials/present.md"))
            .unwrap()
            .contains("## What You Will Learn"));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("docs");
        let source = dir.path().join("a.md");
        fs::write(&source, "# A\n").unwrap();

        let plan = vec![mapping(&source, &docs.join("reference/general/a.md"), Category::Reference)];
        let report = MigrationSession::new(&docs).dry_run(true).run(&plan).unwrap();

        assert!(report.dry_run);
        assert_eq!(report.succeeded, 1);
        assert!(!docs.exists());
    }

    #[test]
    fn test_backup_taken_when_target_exists() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(docs.join("existing.md"), "# Existing\n").unwrap();

        let report = MigrationSession::new(&docs).run(&[]).unwrap();
        let backup = report.backup.unwrap();
        assert_eq!(fs::read_to_string(backup.join("existing.md")).unwrap(), "# Existing\n");

        let out = dir.path().join("report.json");
        report_roundtrip(&MigrationSession::new(&docs).backup(false).run(&[]).unwrap(), &out);
    }

    fn report_roundtrip(report: &MigrationReport, out: &Path) {
        report.write_json(out).unwrap();
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(out).unwrap()).unwrap();
        assert_eq!(value["total"], 0);
        assert!(value["started_at"].is_string());
    }
}
