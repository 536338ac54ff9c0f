//! Corpus quality scoring: link validity, code example sanity, per-category
//! structure, basic formatting and frontmatter metadata.

use regex::Regex;
use serde::Serialize;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::links::count_links;
use crate::markdown::{self, CodeBlock};
use crate::model::{Category, FileRecord, Inventory};
use crate::rewrite::{validate_links, LinkReport};

static BRACKET_PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(?:\.\.\.|[A-Z][A-Z0-9_]+)\]").expect("bracket placeholder pattern"));

static TODO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:todo|fixme)\b").expect("todo pattern"));

static YOUR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<your[^>]*>").expect("your pattern"));

static ENV_PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{[A-Z][A-Z0-9_]*\}").expect("env placeholder pattern"));

static EMPTY_LIST_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?:[-*]|\d+\.)[ \t\r]*$").expect("list item pattern"));

const BALANCE_CHECKED: &[&str] = &["typescript", "ts", "javascript", "js"];

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct InvalidExample {
    pub file: PathBuf,
    pub line: usize,
    pub language: String,
    pub error: String,
}

#[derive(Serialize, Debug, Clone, Default)]
pub struct CodeReport {
    pub total: usize,
    pub valid: usize,
    pub invalid: Vec<InvalidExample>,
}

#[derive(Serialize, Debug, Clone)]
pub struct StructureReport {
    pub file: PathBuf,
    pub category: Category,
    pub missing_sections: Vec<String>,
    pub recommendations: Vec<String>,
}

impl StructureReport {
    pub fn has_issues(&self) -> bool {
        !self.missing_sections.is_empty() || !self.recommendations.is_empty()
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct FormattingReport {
    pub file: PathBuf,
    pub has_h1: bool,
    pub has_code_blocks: bool,
    pub has_links: bool,
    pub issues: Vec<String>,
}

/// Frontmatter fields the scorer cares about.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub last_updated: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct MetadataReport {
    pub file: PathBuf,
    pub metadata: Metadata,
    pub missing_fields: Vec<String>,
}

/// Sub-scores as percentages.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Scores {
    pub links: f64,
    pub code: f64,
    pub structure: f64,
    pub formatting: f64,
    pub metadata: f64,
}

#[derive(Serialize, Debug, Clone)]
pub struct QualityReport {
    pub files: usize,
    /// 0 to 100
    pub overall_score: u32,
    pub scores: Scores,
    pub links: LinkReport,
    pub code: CodeReport,
    pub structure_issues: Vec<StructureReport>,
    pub formatting_issues: Vec<FormattingReport>,
    pub metadata_issues: Vec<MetadataReport>,
    pub recommendations: Vec<String>,
}

/// Exactly three dots that are not a spread (`...args`, `...[`, `...{`, `...(`).
fn has_bare_ellipsis(code: &str) -> bool {
    let bytes = code.as_bytes();
    code.match_indices("...").any(|(i, _)| {
        let before = i.checked_sub(1).map(|j| bytes[j]);
        let after = bytes.get(i + 3).copied();
        let spread_or_longer = matches!(
            after,
            Some(c) if c == b'.' || c == b'_' || c == b'[' || c == b'{' || c == b'(' || c.is_ascii_alphanumeric()
        );
        before != Some(b'.') && !spread_or_longer
    })
}

pub fn has_placeholder(code: &str) -> bool {
    BRACKET_PLACEHOLDER_RE.is_match(code)
        || has_bare_ellipsis(code)
        || TODO_RE.is_match(code)
        || YOUR_RE.is_match(code)
        || ENV_PLACEHOLDER_RE.is_match(code)
}

fn balance_error(code: &str) -> Option<&'static str> {
    let count = |c: char| code.matches(c).count();

    if count('{') != count('}') {
        Some("Unmatched braces")
    } else if count('(') != count(')') {
        Some("Unmatched parentheses")
    } else if count('[') != count(']') {
        Some("Unmatched brackets")
    } else {
        None
    }
}

/// `None` when the block is fine. Blocks without a language tag are never checked.
fn check_block(block: &CodeBlock) -> Option<String> {
    if block.language.is_empty() {
        return None;
    }
    if has_placeholder(&block.code) {
        return Some("Code example contains placeholders".to_string());
    }
    if BALANCE_CHECKED.contains(&block.language.to_lowercase().as_str()) {
        return balance_error(&block.code).map(String::from);
    }
    None
}

pub fn validate_code_examples<'a>(files: impl IntoIterator<Item = &'a FileRecord>) -> CodeReport {
    let mut report = CodeReport::default();

    for file in files {
        for block in markdown::code_blocks(&file.content) {
            report.total += 1;
            match check_block(&block) {
                Some(error) => report.invalid.push(InvalidExample {
                    file: file.path.clone(),
                    line: block.line,
                    language: block.language,
                    error,
                }),
                None => report.valid += 1,
            }
        }
    }

    report
}

fn required_sections(category: Category) -> &'static [&'static str] {
    match category {
        Category::Tutorial => &["Introduction", "Prerequisites", "Steps"],
        Category::HowTo => &["Prerequisites", "Steps"],
        Category::Reference => &["Overview", "Parameters", "Examples"],
        Category::Explanation => &["Overview", "Concepts"],
        Category::Project => &["Overview"],
        Category::Archive | Category::Uncategorized => &[],
    }
}

pub fn validate_structure(record: &FileRecord, category: Category) -> StructureReport {
    let headings: Vec<String> = markdown::headings(&record.content)
        .into_iter()
        .map(|h| h.text.to_lowercase())
        .collect();
    let has_heading = |needle: &str| headings.iter().any(|h| h.contains(needle));

    let missing_sections = required_sections(category)
        .iter()
        .filter(|section| !has_heading(&section.to_lowercase()))
        .map(|section| section.to_string())
        .collect();

    let mut recommendations = Vec::new();
    match category {
        Category::Tutorial if !has_heading("step") => {
            recommendations.push("Tutorials should include step-by-step instructions".to_string())
        }
        Category::HowTo if !has_heading("prerequisite") => {
            recommendations.push("How-to guides should include a prerequisites section".to_string())
        }
        Category::Reference if !has_heading("parameter") && !has_heading("option") => {
            recommendations.push("Reference docs should document parameters or options".to_string())
        }
        _ => {}
    }

    StructureReport {
        file: record.path.clone(),
        category,
        missing_sections,
        recommendations,
    }
}

pub fn validate_formatting(record: &FileRecord) -> FormattingReport {
    let content = &record.content;
    let has_h1 = markdown::headings(content).iter().any(|h| h.level == 1);

    let mut issues = Vec::new();
    if !has_h1 {
        issues.push("Document should start with a level 1 heading (# Title)".to_string());
    }
    if EMPTY_LIST_ITEM_RE.is_match(content) {
        issues.push("Lists should have content after the marker".to_string());
    }

    FormattingReport {
        file: record.path.clone(),
        has_h1,
        has_code_blocks: !markdown::code_blocks(content).is_empty(),
        has_links: count_links(content) > 0,
        issues,
    }
}

fn scalar(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|t| t.trim().trim_matches(['"', '\'']).to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn yaml_metadata(block: &str) -> Option<Metadata> {
    let value: Value = serde_yaml::from_str(block).ok()?;
    let map = value.as_mapping()?;
    let field = |key: &str| map.get(key).and_then(scalar);

    let tags = match map.get("tags") {
        Some(Value::Sequence(items)) => items.iter().filter_map(scalar).collect(),
        Some(other) => scalar(other).map(|s| split_tags(&s)).unwrap_or_default(),
        None => Vec::new(),
    };

    Some(Metadata {
        title: field("title"),
        description: field("description"),
        last_updated: field("last-updated").or_else(|| field("lastUpdated")),
        tags,
    })
}

fn line_metadata(block: &str) -> Metadata {
    let mut metadata = Metadata::default();

    for line in block.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().trim_matches(['"', '\'']).to_string();
        if value.is_empty() {
            continue;
        }
        match key.trim() {
            "title" => metadata.title = Some(value),
            "description" => metadata.description = Some(value),
            "last-updated" | "lastUpdated" => metadata.last_updated = Some(value),
            "tags" => metadata.tags = split_tags(&value),
            _ => {}
        }
    }

    metadata
}

/// Read frontmatter fields, falling back to the first `# ` heading for the title.
pub fn extract_metadata(content: &str) -> Metadata {
    let mut metadata = match markdown::frontmatter(content) {
        Some((block, _)) => yaml_metadata(block).unwrap_or_else(|| line_metadata(block)),
        None => Metadata::default(),
    };

    if metadata.title.is_none() {
        metadata.title = markdown::headings(content)
            .into_iter()
            .find(|h| h.level == 1)
            .map(|h| h.text);
    }

    metadata
}

pub fn validate_metadata(record: &FileRecord) -> MetadataReport {
    let metadata = extract_metadata(&record.content);

    let mut missing_fields = Vec::new();
    if metadata.title.is_none() {
        missing_fields.push("title".to_string());
    }
    if metadata.description.is_none() {
        missing_fields.push("description".to_string());
    }
    if metadata.last_updated.is_none() {
        missing_fields.push("last-updated".to_string());
    }
    if metadata.tags.is_empty() {
        missing_fields.push("tags".to_string());
    }

    MetadataReport {
        file: record.path.clone(),
        metadata,
        missing_fields,
    }
}

fn percent(good: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        good as f64 / total as f64 * 100.0
    }
}

/// Score the whole corpus. Links are resolved against the inventory and the
/// filesystem; root-relative URLs resolve against `root_dir`.
pub fn generate_quality_report(inventory: &Inventory, root_dir: &Path) -> QualityReport {
    let contents: BTreeMap<PathBuf, String> = inventory
        .files()
        .iter()
        .map(|f| (f.path.clone(), f.content.clone()))
        .collect();

    let links = validate_links(&contents, root_dir);
    let code = validate_code_examples(inventory.files());

    let mut structure_issues = Vec::new();
    let mut formatting_issues = Vec::new();
    let mut metadata_issues = Vec::new();

    for (record, category) in inventory.iter() {
        let structure = validate_structure(record, category);
        if structure.has_issues() {
            structure_issues.push(structure);
        }

        let formatting = validate_formatting(record);
        if !formatting.issues.is_empty() {
            formatting_issues.push(formatting);
        }

        let metadata = validate_metadata(record);
        if !metadata.missing_fields.is_empty() {
            metadata_issues.push(metadata);
        }
    }

    let files = inventory.len();
    let scores = Scores {
        links: percent(links.valid.len(), links.internal_count()),
        code: percent(code.valid, code.total),
        structure: percent(files - structure_issues.len(), files),
        formatting: percent(files - formatting_issues.len(), files),
        metadata: percent(files - metadata_issues.len(), files),
    };
    let mean = (scores.links + scores.code + scores.structure + scores.formatting + scores.metadata) / 5.0;

    let mut recommendations = Vec::new();
    if !links.broken.is_empty() {
        recommendations.push(format!("Fix {} broken links", links.broken.len()));
    }
    if !code.invalid.is_empty() {
        recommendations.push(format!("Fix {} invalid code examples", code.invalid.len()));
    }
    if !structure_issues.is_empty() {
        recommendations.push(format!("Improve structure in {} documents", structure_issues.len()));
    }
    if !metadata_issues.is_empty() {
        recommendations.push(format!("Add missing metadata to {} documents", metadata_issues.len()));
    }

    QualityReport {
        files,
        overall_score: mean.round() as u32,
        scores,
        links,
        code,
        structure_issues,
        formatting_issues,
        metadata_issues,
        recommendations,
    }
}
