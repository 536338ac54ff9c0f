use serde::Serialize;
use std::collections::HashSet;

use crate::model::FileRecord;
use crate::similarity::similarity;

pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// Files whose pairwise content similarity exceeds the threshold.
#[derive(Serialize, Debug, Clone)]
pub struct DuplicateSet<'a> {
    pub files: Vec<&'a FileRecord>,
    /// Mean of all pairwise similarities within the set
    pub similarity: f64,
    pub recommendation: String,
}

impl DuplicateSet<'_> {
    pub fn most_recent(&self) -> Option<&FileRecord> {
        most_recent(&self.files)
    }
}

fn most_recent<'a>(files: &[&'a FileRecord]) -> Option<&'a FileRecord> {
    files.iter().copied().fold(None, |latest: Option<&FileRecord>, file| match latest {
        Some(l) if file.modified <= l.modified => Some(l),
        _ => Some(file),
    })
}

fn average_similarity(files: &[&FileRecord]) -> f64 {
    if files.len() < 2 {
        return 1.0;
    }

    let mut total = 0.0;
    let mut comparisons = 0;
    for i in 0..files.len() {
        for j in (i + 1)..files.len() {
            total += similarity(&files[i].content, &files[j].content);
            comparisons += 1;
        }
    }

    total / comparisons as f64
}

fn recommendation(files: &[&FileRecord]) -> String {
    match most_recent(files) {
        Some(keeper) => format!(
            "Consider consolidating into {} (most recent) and archiving others",
            keeper.name
        ),
        None => String::new(),
    }
}

/// Group records whose content similarity exceeds `threshold` against the
/// first unassigned record of each group.
///
/// Every pair is compared, so this is O(n^2) in file count and linear in
/// content length per comparison. Fine for documentation trees with
/// hundreds of files.
pub fn find_duplicates(records: &[FileRecord], threshold: f64) -> Vec<DuplicateSet<'_>> {
    let mut sets = Vec::new();
    let mut assigned: HashSet<usize> = HashSet::new();

    for i in 0..records.len() {
        if assigned.contains(&i) {
            continue;
        }

        let mut group = vec![&records[i]];
        for j in (i + 1)..records.len() {
            if assigned.contains(&j) {
                continue;
            }
            if similarity(&records[i].content, &records[j].content) > threshold {
                group.push(&records[j]);
                assigned.insert(j);
            }
        }

        if group.len() > 1 {
            assigned.insert(i);
            sets.push(DuplicateSet {
                similarity: average_similarity(&group),
                recommendation: recommendation(&group),
                files: group,
            });
        }
    }

    sets
}
