use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::links::count_links;
use crate::model::{Category, FileRecord, Inventory};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl Effort {
    pub fn as_str(self) -> &'static str {
        match self {
            Effort::Low => "low",
            Effort::Medium => "medium",
            Effort::High => "high",
        }
    }
}

/// Planned relocation of one file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MigrationMapping {
    pub old_path: PathBuf,
    pub new_path: PathBuf,
    pub category: Category,
    /// 1 (least urgent) to 10
    pub priority: u8,
    pub estimated_effort: Effort,
}

/// Subcategory keywords, checked in order against content and path.
const SUBCATEGORIES: &[(&str, &str)] = &[
    ("auth", "authentication"),
    ("checkout", "checkout"),
    ("deploy", "deployment"),
    ("test", "testing"),
    ("api", "api"),
    ("architecture", "architecture"),
    ("config", "configuration"),
    ("component", "components"),
];

pub fn infer_subcategory(record: &FileRecord) -> &'static str {
    let content = record.content.to_lowercase();
    let path = record.path.to_string_lossy().to_lowercase();

    SUBCATEGORIES
        .iter()
        .find(|(keyword, _)| content.contains(keyword) || path.contains(keyword))
        .map(|(_, folder)| *folder)
        .unwrap_or("general")
}

/// Rough migration effort from content length and markdown link count.
pub fn estimate_effort(content: &str) -> Effort {
    let length = content.chars().count();
    let links = count_links(content);

    if length > 5000 || links > 20 {
        Effort::High
    } else if length > 2000 || links > 10 {
        Effort::Medium
    } else {
        Effort::Low
    }
}

/// Builds the prioritized old-path to new-path plan for an inventory.
#[derive(Debug, Clone)]
pub struct MigrationPlanner {
    target_root: PathBuf,
    now: DateTime<Utc>,
    recent_days: i64,
}

impl MigrationPlanner {
    pub fn new(target_root: impl Into<PathBuf>) -> Self {
        MigrationPlanner {
            target_root: target_root.into(),
            now: Utc::now(),
            recent_days: 30,
        }
    }

    /// Pin the clock used for archive dates and recency boosts.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn with_recent_days(mut self, days: i64) -> Self {
        self.recent_days = days;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    pub fn new_path(&self, record: &FileRecord, category: Category) -> PathBuf {
        let root = &self.target_root;
        let name = &record.name;

        match category {
            Category::Tutorial => root.join("tutorials").join(name),
            Category::HowTo => root.join("how-to").join(infer_subcategory(record)).join(name),
            Category::Reference => root.join("reference").join(infer_subcategory(record)).join(name),
            Category::Explanation => root.join("explanation").join(infer_subcategory(record)).join(name),
            Category::Project => root.join("project").join(name),
            Category::Archive => root
                .join("archive")
                .join(self.today().format("%Y-%m-%d").to_string())
                .join(name),
            Category::Uncategorized => root.join("uncategorized").join(name),
        }
    }

    pub fn priority(&self, record: &FileRecord, category: Category) -> u8 {
        let mut priority: i32 = 5;

        match category {
            Category::Tutorial => priority += 2,
            Category::HowTo => priority += 1,
            Category::Archive => priority -= 3,
            _ => {}
        }

        let name = record.name.to_lowercase();
        if name.contains("getting-started") {
            priority += 3;
        }
        if name.contains("readme") {
            priority += 2;
        }

        let modified: DateTime<Utc> = record.modified.into();
        let age = self.now.signed_duration_since(modified);
        if age.num_seconds() < self.recent_days * 24 * 60 * 60 {
            priority += 1;
        }

        priority.clamp(1, 10) as u8
    }

    /// One mapping per file that has to move, highest priority first, with
    /// unique targets. Files already at their target are left out before
    /// collisions are resolved, so they never push a newcomer onto `-1`.
    pub fn create_migration_mapping(&self, inventory: &Inventory) -> Vec<MigrationMapping> {
        let mut mappings: Vec<MigrationMapping> = inventory
            .iter()
            .map(|(record, category)| MigrationMapping {
                old_path: record.path.clone(),
                new_path: self.new_path(record, category),
                category,
                priority: self.priority(record, category),
                estimated_effort: estimate_effort(&record.content),
            })
            .filter(|m| m.old_path != m.new_path)
            .collect();

        mappings.sort_by(|a, b| b.priority.cmp(&a.priority));
        deconflict_targets(&mut mappings);
        mappings
    }
}

/// `name-N.ext` for the first N >= 1 not already taken.
pub(crate) fn numbered_variant(path: &Path, n: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let file_name = match path.extension() {
        Some(ext) => format!("{stem}-{n}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{n}"),
    };
    path.with_file_name(file_name)
}

/// Rename colliding targets in plan order so every `new_path` is unique.
/// Earlier (higher priority) entries keep their clean names. Only the plan
/// itself counts: a target already on disk is kept and surfaces as a
/// conflict when the file is migrated.
pub fn deconflict_targets(mappings: &mut [MigrationMapping]) {
    let mut taken: HashSet<PathBuf> = HashSet::new();

    for mapping in mappings.iter_mut() {
        if taken.contains(&mapping.new_path) {
            let mut n = 1;
            let mut candidate = numbered_variant(&mapping.new_path, n);
            while taken.contains(&candidate) {
                n += 1;
                candidate = numbered_variant(&mapping.new_path, n);
            }
            tracing::debug!(
                from = %mapping.new_path.display(),
                to = %candidate.display(),
                "renamed colliding migration target"
            );
            mapping.new_path = candidate;
        }
        taken.insert(mapping.new_path.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::{Duration, SystemTime};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    fn days_ago(days: u64) -> SystemTime {
        SystemTime::from(now()) - Duration::from_secs(days * 24 * 60 * 60)
    }

    fn record(path: &str, content: &str, age_days: u64) -> FileRecord {
        FileRecord::new(path, content, days_ago(age_days))
    }

    fn planner() -> MigrationPlanner {
        MigrationPlanner::new("docs").at(now())
    }

    #[test]
    fn test_new_paths_per_category() {
        let p = planner();
        let r = record("/src/intro.md", "", 100);
        assert_eq!(p.new_path(&r, Category::Tutorial), PathBuf::from("docs/tutorials/intro.md"));
        assert_eq!(p.new_path(&r, Category::Project), PathBuf::from("docs/project/intro.md"));
        assert_eq!(
            p.new_path(&r, Category::Archive),
            PathBuf::from("docs/archive/2024-03-15/intro.md")
        );
        assert_eq!(
            p.new_path(&r, Category::Uncategorized),
            PathBuf::from("docs/uncategorized/intro.md")
        );
        assert_eq!(
            p.new_path(&r, Category::HowTo),
            PathBuf::from("docs/how-to/general/intro.md")
        );
    }

    #[test]
    fn test_infer_subcategory_order() {
        assert_eq!(infer_subcategory(&record("/x/login.md", "OAuth login flow", 0)), "authentication");
        assert_eq!(infer_subcategory(&record("/x/pay.md", "the checkout and tests", 0)), "checkout");
        assert_eq!(infer_subcategory(&record("/x/deploy/ship.md", "", 0)), "deployment");
        assert_eq!(infer_subcategory(&record("/x/a.md", "api plus config", 0)), "api");
        assert_eq!(infer_subcategory(&record("/x/a.md", "the component tree", 0)), "components");
        assert_eq!(infer_subcategory(&record("/x/a.md", "nothing special", 0)), "general");
    }

    #[test]
    fn test_priority_scoring() {
        let p = planner();
        assert_eq!(p.priority(&record("/x/a.md", "", 100), Category::Reference), 5);
        assert_eq!(p.priority(&record("/x/a.md", "", 100), Category::Tutorial), 7);
        assert_eq!(p.priority(&record("/x/a.md", "", 100), Category::HowTo), 6);
        assert_eq!(p.priority(&record("/x/a.md", "", 5), Category::Reference), 6);
        assert_eq!(p.priority(&record("/x/a.md", "", 100), Category::Archive), 2);
        // 5 + 2 + 3 + 2 + 1 clamps to 10
        assert_eq!(
            p.priority(&record("/x/getting-started-readme.md", "", 1), Category::Tutorial),
            10
        );
    }

    #[test]
    fn test_effort_thresholds() {
        assert_eq!(estimate_effort("short"), Effort::Low);
        assert_eq!(estimate_effort(&"x".repeat(2001)), Effort::Medium);
        assert_eq!(estimate_effort(&"x".repeat(5001)), Effort::High);
        assert_eq!(estimate_effort(&"[a](b) ".repeat(11)), Effort::Medium);
        assert_eq!(estimate_effort(&"[a](b) ".repeat(21)), Effort::High);
    }

    #[test]
    fn test_mapping_sorted_by_priority() {
        let inventory = Inventory::new(vec![
            record("/src/archive/old-notes.md", "", 100),
            record("/src/tutorials/getting-started.md", "", 100),
            record("/src/reference/api/users.md", "", 100),
        ]);

        let mappings = planner().create_migration_mapping(&inventory);
        assert_eq!(mappings.len(), 3);
        let priorities: Vec<u8> = mappings.iter().map(|m| m.priority).collect();
        assert_eq!(priorities, vec![10, 5, 2]);
        assert_eq!(mappings[0].category, Category::Tutorial);
        assert_eq!(mappings[0].new_path, PathBuf::from("docs/tutorials/getting-started.md"));
    }

    #[test]
    fn test_colliding_targets_are_renamed() {
        let inventory = Inventory::new(vec![
            record("/src/tutorials/a/intro.md", "", 100),
            record("/src/tutorials/b/intro.md", "", 100),
            record("/src/tutorials/c/intro.md", "", 100),
        ]);

        let mappings = planner().create_migration_mapping(&inventory);
        let targets: HashSet<&PathBuf> = mappings.iter().map(|m| &m.new_path).collect();
        assert_eq!(targets.len(), 3);
        assert_eq!(mappings[0].new_path, PathBuf::from("docs/tutorials/intro.md"));
        assert_eq!(mappings[1].new_path, PathBuf::from("docs/tutorials/intro-1.md"));
        assert_eq!(mappings[2].new_path, PathBuf::from("docs/tutorials/intro-2.md"));
    }

    #[test]
    fn test_in_place_files_do_not_claim_targets() {
        let inventory = Inventory::new(vec![
            record("docs/tutorials/getting-started.md", "", 100),
            record("/notes/tutorials/getting-started.md", "", 100),
        ]);

        let mappings = planner().create_migration_mapping(&inventory);
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].old_path, PathBuf::from("/notes/tutorials/getting-started.md"));
        assert_eq!(mappings[0].new_path, PathBuf::from("docs/tutorials/getting-started.md"));
    }

    #[test]
    fn test_numbered_variant() {
        assert_eq!(numbered_variant(Path::new("a/b.md"), 2), PathBuf::from("a/b-2.md"));
        assert_eq!(numbered_variant(Path::new("a/LICENSE"), 1), PathBuf::from("a/LICENSE-1"));
    }
}
