use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::classify;

/// Taxonomy a document is routed into.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Tutorial,
    HowTo,
    Reference,
    Explanation,
    Project,
    Archive,
    Uncategorized,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Tutorial,
        Category::HowTo,
        Category::Reference,
        Category::Explanation,
        Category::Project,
        Category::Archive,
        Category::Uncategorized,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Tutorial => "tutorial",
            Category::HowTo => "how-to",
            Category::Reference => "reference",
            Category::Explanation => "explanation",
            Category::Project => "project",
            Category::Archive => "archive",
            Category::Uncategorized => "uncategorized",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scanned document. Immutable once built; its category lives in an [`Inventory`].
#[derive(Serialize, Debug, Clone)]
pub struct FileRecord {
    pub path: PathBuf,
    pub rel_path: PathBuf,
    pub name: String,
    pub size: u64,
    pub modified: SystemTime,
    #[serde(skip)]
    pub content: String,
}

impl FileRecord {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>, modified: SystemTime) -> Self {
        let path = path.into();
        let content = content.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        FileRecord {
            rel_path: path.clone(),
            path,
            name,
            size: content.len() as u64,
            modified,
            content,
        }
    }

    pub fn with_rel_path(mut self, rel_path: impl Into<PathBuf>) -> Self {
        self.rel_path = rel_path.into();
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Lower-cased file name without its extension.
    pub fn stem(&self) -> String {
        Path::new(&self.name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }
}

/// Scanned records plus the category assigned to each, index for index.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    files: Vec<FileRecord>,
    categories: Vec<Category>,
}

impl Inventory {
    pub fn new(files: Vec<FileRecord>) -> Self {
        let categories = classify::classify(&files);
        Inventory { files, categories }
    }

    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FileRecord, Category)> + '_ {
        self.files.iter().zip(self.categories.iter().copied())
    }

    pub fn category_of(&self, path: &Path) -> Option<Category> {
        self.iter().find(|(f, _)| f.path == path).map(|(_, c)| c)
    }

    pub fn in_category(&self, category: Category) -> Vec<&FileRecord> {
        self.iter()
            .filter(|(_, c)| *c == category)
            .map(|(f, _)| f)
            .collect()
    }

    /// File count for every category, including empty ones.
    pub fn counts(&self) -> BTreeMap<Category, usize> {
        let mut counts: BTreeMap<Category, usize> = Category::ALL.iter().map(|c| (*c, 0)).collect();
        for category in &self.categories {
            *counts.entry(*category).or_insert(0) += 1;
        }
        counts
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}
