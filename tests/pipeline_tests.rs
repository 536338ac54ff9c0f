use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use doctidy::duplicates::find_duplicates;
use doctidy::migrate::archive_file;
use doctidy::quality::generate_quality_report;
use doctidy::scanner::scan_directory;
use doctidy::{Category, Config, Inventory, MigrationPlanner, MigrationSession};

fn write(path: &Path, content: &str, modified: SystemTime) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(modified)
        .unwrap();
}

fn old_time() -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_500_000_000)
}

const GETTING_STARTED: &str =
    "# Getting Started\n\nThis tutorial walks you through the basics. Next read [the API](api.md#usage).\n";
const API: &str = "# API\n\nEndpoint parameters and returns.\n";

#[test]
fn test_scan_plan_migrate_score() {
    let dir = tempfile::tempdir().unwrap();
    let notes = dir.path().join("notes");
    let docs = dir.path().join("docs");
    write(&notes.join("getting-started.md"), GETTING_STARTED, old_time());
    write(&notes.join("api.md"), API, old_time());

    let inventory = Inventory::new(scan_directory(&notes, &Config::default()).unwrap());
    assert_eq!(inventory.len(), 2);
    assert_eq!(inventory.in_category(Category::Tutorial).len(), 1);
    assert_eq!(inventory.in_category(Category::Reference).len(), 1);

    let plan = MigrationPlanner::new(&docs).create_migration_mapping(&inventory);
    assert_eq!(plan[0].category, Category::Tutorial);
    assert_eq!(plan[0].new_path, docs.join("tutorials/getting-started.md"));
    assert_eq!(plan[1].new_path, docs.join("reference/api/api.md"));

    let report = MigrationSession::new(&docs)
        .backup(false)
        .adapt_content(false)
        .run(&plan)
        .unwrap();
    assert_eq!(report.succeeded, 2, "{:?}", report.errors);
    assert_eq!(report.links_updated, 1);

    let tutorial = docs.join("tutorials/getting-started.md");
    assert_eq!(
        fs::read_to_string(&tutorial).unwrap(),
        GETTING_STARTED.replace("(api.md#usage)", "(../reference/api/api.md#usage)")
    );
    assert_eq!(fs::metadata(&tutorial).unwrap().modified().unwrap(), old_time());

    let api = docs.join("reference/api/api.md");
    assert_eq!(fs::read_to_string(&api).unwrap(), API);
    assert_eq!(fs::metadata(&api).unwrap().modified().unwrap(), old_time());

    // sources stay where they were
    assert_eq!(fs::read_to_string(notes.join("api.md")).unwrap(), API);

    let migrated = Inventory::new(scan_directory(&docs, &Config::default()).unwrap());
    assert_eq!(migrated.len(), 2);
    let quality = generate_quality_report(&migrated, &docs.canonicalize().unwrap());
    assert!(quality.links.broken.is_empty(), "{:?}", quality.links.broken);
    assert_eq!(quality.scores.links, 100.0);
    assert!(quality.overall_score <= 100);
}

#[test]
fn test_adapted_migration_adds_sections_once() {
    let dir = tempfile::tempdir().unwrap();
    let notes = dir.path().join("notes");
    let docs = dir.path().join("docs");
    write(&notes.join("tutorials/intro.md"), "# Intro\n\nBody.\n", old_time());

    let inventory = Inventory::new(scan_directory(&notes, &Config::default()).unwrap());
    let plan = MigrationPlanner::new(&docs).create_migration_mapping(&inventory);
    let report = MigrationSession::new(&docs).backup(false).run(&plan).unwrap();
    assert_eq!(report.succeeded, 1);

    let content = fs::read_to_string(docs.join("tutorials/intro.md")).unwrap();
    assert_eq!(content.matches("## What You Will Learn").count(), 1);
    assert_eq!(content.matches("## Prerequisites").count(), 1);
    assert!(content.starts_with("# Intro\n"));
    assert!(content.ends_with("Body.\n"));
}

#[test]
fn test_rerun_reports_conflicts_without_overwriting() {
    let dir = tempfile::tempdir().unwrap();
    let notes = dir.path().join("notes");
    let docs = dir.path().join("docs");
    write(&notes.join("reference/config.md"), "# Config\n", old_time());

    let inventory = Inventory::new(scan_directory(&notes, &Config::default()).unwrap());
    let plan = MigrationPlanner::new(&docs).create_migration_mapping(&inventory);
    MigrationSession::new(&docs).backup(false).run(&plan).unwrap();

    let target = &plan[0].new_path;
    fs::write(target, "# Edited after migration\n").unwrap();

    let second = MigrationSession::new(&docs).run(&plan).unwrap();
    assert_eq!(second.failed, 1);
    assert!(second.errors[0].contains("already exists"));
    assert!(second.backup.is_some());
    assert_eq!(fs::read_to_string(target).unwrap(), "# Edited after migration\n");
}

#[test]
fn test_duplicates_then_archive_keeps_originals() {
    let dir = tempfile::tempdir().unwrap();
    let base = "Install the command line tool, configure the project settings and run the deployment pipeline against staging before production";
    let mut records = Vec::new();
    for i in 0..4 {
        let path = dir.path().join(format!("copy-{i}.md"));
        let content = format!("{base} variant{i}");
        write(&path, &content, old_time() + Duration::from_secs(i));
        records.push(path);
    }

    let scanned = scan_directory(dir.path(), &Config::default()).unwrap();
    let sets = find_duplicates(&scanned, 0.8);
    let grouped: usize = sets.iter().map(|s| s.files.len()).sum();
    assert!(grouped >= 3);

    let archive_root = dir.path().join("archive");
    let archived = archive_file(&records[0], &archive_root).unwrap();
    assert_eq!(
        fs::read_to_string(&archived).unwrap(),
        fs::read_to_string(&records[0]).unwrap()
    );
    assert!(records[0].exists());
}

#[test]
fn test_second_migration_conflicts_instead_of_duplicating() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let docs = root.join("docs");
    write(&root.join("notes/getting-started.md"), GETTING_STARTED, old_time());

    let plan_for = |root: &Path| {
        let inventory = Inventory::new(scan_directory(root, &Config::default()).unwrap());
        MigrationPlanner::new(&docs).create_migration_mapping(&inventory)
    };

    let first = MigrationSession::new(&docs).run(&plan_for(&root)).unwrap();
    assert_eq!(first.succeeded, 1);

    // the migrated copy is already home, so only the source is planned again
    let plan = plan_for(&root);
    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].new_path, docs.join("tutorials/getting-started.md"));

    let second = MigrationSession::new(&docs).run(&plan).unwrap();
    assert_eq!(second.failed, 1);
    assert!(second.errors[0].contains("already exists"));
    assert!(second.backup.is_some());

    let names: Vec<String> = scan_directory(&root, &Config::default())
        .unwrap()
        .iter()
        .map(|r| r.rel_path.to_string_lossy().replace('\\', "/"))
        .collect();
    assert_eq!(names, vec!["docs/tutorials/getting-started.md", "notes/getting-started.md"]);
}

#[test]
fn test_scanning_a_category_directory_keeps_its_path_signal() {
    let dir = tempfile::tempdir().unwrap();
    let tutorials = dir.path().join("docs/tutorials");
    write(&tutorials.join("x.md"), "plain words", old_time());

    let inventory = Inventory::new(scan_directory(&tutorials, &Config::default()).unwrap());
    assert_eq!(inventory.in_category(Category::Tutorial).len(), 1);
}
