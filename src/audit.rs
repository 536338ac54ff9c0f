use serde::Serialize;
use std::collections::BTreeMap;

use crate::duplicates::{find_duplicates, DuplicateSet};
use crate::gaps::{identify_gaps, GapPriority, GapReport};
use crate::model::{Category, Inventory};

#[derive(Serialize, Debug, Clone)]
pub struct AuditSummary {
    pub total_files: usize,
    pub total_size: u64,
    pub by_category: BTreeMap<Category, usize>,
    pub duplicate_sets: usize,
    pub total_gaps: usize,
}

/// Inventory summary plus duplicate and gap findings.
#[derive(Serialize, Debug, Clone)]
pub struct AuditReport<'a> {
    pub summary: AuditSummary,
    pub duplicates: Vec<DuplicateSet<'a>>,
    pub gaps: GapReport,
    pub recommendations: Vec<String>,
}

pub fn generate_audit_report(inventory: &Inventory, threshold: f64) -> AuditReport<'_> {
    let duplicates = find_duplicates(inventory.files(), threshold);
    let gaps = identify_gaps(inventory);
    let by_category = inventory.counts();

    let mut recommendations = Vec::new();
    if !duplicates.is_empty() {
        recommendations.push(format!(
            "Found {} sets of duplicate content. Consider consolidating.",
            duplicates.len()
        ));
    }
    if matches!(gaps.priority, GapPriority::Critical | GapPriority::High) {
        recommendations.push(format!(
            "Documentation gaps detected with {} priority. Focus on creating missing content.",
            gaps.priority
        ));
    }
    let uncategorized = by_category.get(&Category::Uncategorized).copied().unwrap_or(0);
    if uncategorized > 0 {
        recommendations.push(format!(
            "{uncategorized} files could not be categorized. Review and categorize manually."
        ));
    }

    AuditReport {
        summary: AuditSummary {
            total_files: inventory.len(),
            total_size: inventory.total_size(),
            by_category,
            duplicate_sets: duplicates.len(),
            total_gaps: gaps.total(),
        },
        duplicates,
        gaps,
        recommendations,
    }
}
