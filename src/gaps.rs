use serde::Serialize;
use std::fmt;

use crate::model::{Category, Inventory};

const REQUIRED_TUTORIALS: &[&str] = &[
    "getting-started",
    "first-feature",
    "testing-basics",
    "deployment-basics",
];

const REQUIRED_HOW_TOS: &[&str] = &[
    "authentication",
    "checkout",
    "deployment",
    "testing",
    "database-migration",
];

const REQUIRED_REFERENCE: &[&str] = &["api-reference", "architecture", "configuration", "components"];

const REQUIRED_EXPLANATIONS: &[&str] = &["architecture-overview", "design-decisions", "security-model"];

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GapPriority {
    Critical,
    High,
    Medium,
    Low,
}

impl GapPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            GapPriority::Critical => "critical",
            GapPriority::High => "high",
            GapPriority::Medium => "medium",
            GapPriority::Low => "low",
        }
    }

    fn from_total(total: usize) -> Self {
        match total {
            t if t > 10 => GapPriority::Critical,
            t if t > 5 => GapPriority::High,
            t if t > 2 => GapPriority::Medium,
            _ => GapPriority::Low,
        }
    }
}

impl fmt::Display for GapPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct GapReport {
    pub missing_tutorials: Vec<String>,
    pub missing_how_tos: Vec<String>,
    pub missing_reference: Vec<String>,
    pub missing_explanations: Vec<String>,
    pub priority: GapPriority,
}

impl GapReport {
    pub fn total(&self) -> usize {
        self.missing_tutorials.len()
            + self.missing_how_tos.len()
            + self.missing_reference.len()
            + self.missing_explanations.len()
    }
}

fn missing_topics(inventory: &Inventory, category: Category, required: &[&str]) -> Vec<String> {
    let existing: Vec<String> = inventory.in_category(category).iter().map(|f| f.stem()).collect();

    required
        .iter()
        .filter(|topic| !existing.iter().any(|name| name.contains(*topic)))
        .map(|topic| topic.to_string())
        .collect()
}

/// Check each category's files against its required-topic checklist.
pub fn identify_gaps(inventory: &Inventory) -> GapReport {
    let missing_tutorials = missing_topics(inventory, Category::Tutorial, REQUIRED_TUTORIALS);
    let missing_how_tos = missing_topics(inventory, Category::HowTo, REQUIRED_HOW_TOS);
    let missing_reference = missing_topics(inventory, Category::Reference, REQUIRED_REFERENCE);
    let missing_explanations = missing_topics(inventory, Category::Explanation, REQUIRED_EXPLANATIONS);

    let total = missing_tutorials.len()
        + missing_how_tos.len()
        + missing_reference.len()
        + missing_explanations.len();

    GapReport {
        missing_tutorials,
        missing_how_tos,
        missing_reference,
        missing_explanations,
        priority: GapPriority::from_total(total),
    }
}
