use crate::model::{Category, FileRecord};

const TUTORIAL_KEYWORDS: &[&str] = &[
    "getting started",
    "step by step",
    "tutorial",
    "walkthrough",
    "first",
    "beginner",
    "introduction to",
];

const HOW_TO_KEYWORDS: &[&str] = &[
    "how to", "guide", "configure", "setup", "deploy", "install", "create", "build",
];

const REFERENCE_KEYWORDS: &[&str] = &[
    "api",
    "reference",
    "specification",
    "parameters",
    "returns",
    "endpoint",
    "function",
    "method",
    "property",
];

const EXPLANATION_KEYWORDS: &[&str] = &[
    "why",
    "concept",
    "architecture",
    "design",
    "pattern",
    "principle",
    "understanding",
    "explanation",
];

/// Path fragments checked in order; each is matched as the start of a path component.
const PATH_RULES: &[(&[&str], Category)] = &[
    (&["tutorial", "getting-started"], Category::Tutorial),
    (&["how-to", "guide"], Category::HowTo),
    (&["reference", "api", "config"], Category::Reference),
    (&["explanation", "concept", "architecture"], Category::Explanation),
];

fn by_path(record: &FileRecord) -> Option<Category> {
    let path = format!(
        "/{}",
        record.path.to_string_lossy().replace('\\', "/").to_lowercase()
    );
    let has = |fragment: &str| path.contains(&format!("/{fragment}"));

    for (fragments, category) in PATH_RULES {
        if fragments.iter().any(|f| has(f)) {
            return Some(*category);
        }
    }

    let name = record.name.to_lowercase();
    if has("project") || ["roadmap", "changelog", "status"].iter().any(|k| name.contains(k)) {
        return Some(Category::Project);
    }
    if has("archive") || has("old") {
        return Some(Category::Archive);
    }

    None
}

fn count_keywords(content: &str, keywords: &[&str]) -> usize {
    keywords.iter().map(|k| content.matches(k).count()).sum()
}

fn by_content(content: &str) -> Category {
    let content = content.to_lowercase();
    let scores = [
        (Category::Tutorial, count_keywords(&content, TUTORIAL_KEYWORDS)),
        (Category::HowTo, count_keywords(&content, HOW_TO_KEYWORDS)),
        (Category::Reference, count_keywords(&content, REFERENCE_KEYWORDS)),
        (Category::Explanation, count_keywords(&content, EXPLANATION_KEYWORDS)),
    ];

    let max = scores.iter().map(|(_, s)| *s).max().unwrap_or(0);
    if max == 0 {
        return Category::Uncategorized;
    }

    scores
        .iter()
        .find(|(_, s)| *s == max)
        .map(|(c, _)| *c)
        .unwrap_or(Category::Uncategorized)
}

/// Assign a taxonomy category: path hints first, then keyword counts over the content.
pub fn categorize_file(record: &FileRecord) -> Category {
    by_path(record).unwrap_or_else(|| by_content(&record.content))
}

/// Classify every record; the result is index-aligned with `records`.
pub fn classify(records: &[FileRecord]) -> Vec<Category> {
    records.iter().map(categorize_file).collect()
}
