use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::links::{self, is_external, normalize_path, resolve_target, split_url, to_url_path, Link};
use crate::planner::MigrationMapping;

/// Absolute old file path to absolute new file path.
pub type LinkMap = HashMap<PathBuf, PathBuf>;

/// Build a normalized link map from a migration plan.
pub fn link_map(mappings: &[MigrationMapping]) -> LinkMap {
    mappings
        .iter()
        .map(|m| (normalize_path(&m.old_path), normalize_path(&m.new_path)))
        .collect()
}

fn parent_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new(""))
}

/// Compute the replacement URL for a link written in `source_file` once the
/// document lives at `dest_file`. `None` means leave the URL as it is.
fn rewritten_url(url: &str, map: &LinkMap, source_file: &Path, dest_file: &Path) -> Option<String> {
    if is_external(url) || url.starts_with('#') {
        return None;
    }

    let (target, suffix) = split_url(url);
    if target.is_empty() {
        return None;
    }

    let old_abs = resolve_target(source_file, target);
    let new_abs = match map.get(&old_abs) {
        Some(mapped) => mapped.clone(),
        // site-root URLs do not depend on where the document lives
        None if target.starts_with('/') => return None,
        // unmapped target: only needs work when the document itself moved
        None if source_file != dest_file => old_abs,
        None => return None,
    };

    let relative = pathdiff::diff_paths(&new_abs, parent_dir(dest_file))?;
    let rewritten = format!("{}{}", to_url_path(&relative), suffix);
    (rewritten != url).then_some(rewritten)
}

/// Rewrite internal link targets of a document moving from `source_file` to
/// `dest_file`. Returns the new text and the number of links changed.
///
/// Replacements are applied last-to-first so earlier byte offsets stay valid;
/// everything outside the rewritten URLs is preserved byte for byte.
pub fn rewrite_links(content: &str, map: &LinkMap, source_file: &Path, dest_file: &Path) -> (String, usize) {
    let source_file = normalize_path(source_file);
    let dest_file = normalize_path(dest_file);

    let edits: Vec<_> = links::scan_links(content)
        .into_iter()
        .filter_map(|span| {
            rewritten_url(&span.link.url, map, &source_file, &dest_file).map(|url| (span.url_range, url))
        })
        .collect();

    let mut updated = content.to_string();
    for (range, url) in edits.iter().rev() {
        updated.replace_range(range.clone(), url);
    }

    (updated, edits.len())
}

/// Rewrite links in a document that stays at `current_file`.
pub fn update_links_in_content(content: &str, map: &LinkMap, current_file: &Path) -> String {
    rewrite_links(content, map, current_file, current_file).0
}

/// Return `link` with its URL pointed at the mapped location, if any.
pub fn update_link(link: &Link, map: &LinkMap, current_file: &Path) -> Link {
    let current_file = normalize_path(current_file);
    match rewritten_url(&link.url, map, &current_file, &current_file) {
        Some(url) => Link { url, ..link.clone() },
        None => link.clone(),
    }
}

/// A link found during validation, with the file it appears in.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LinkRef {
    pub file: PathBuf,
    pub text: String,
    pub url: String,
    pub line: usize,
    pub column: usize,
}

impl LinkRef {
    fn new(file: &Path, link: Link) -> Self {
        LinkRef {
            file: file.to_path_buf(),
            text: link.text,
            url: link.url,
            line: link.line,
            column: link.column,
        }
    }
}

/// Every link lands in exactly one bucket.
#[derive(Serialize, Debug, Clone, Default)]
pub struct LinkReport {
    pub valid: Vec<LinkRef>,
    pub broken: Vec<LinkRef>,
    pub external: Vec<LinkRef>,
}

impl LinkReport {
    pub fn internal_count(&self) -> usize {
        self.valid.len() + self.broken.len()
    }
}

fn link_resolves(file: &Path, link: &Link, known: &HashSet<PathBuf>, root_dir: &Path) -> bool {
    let target = link.target();
    if link.is_anchor_only() || target.is_empty() {
        return true;
    }

    let resolved = match target.strip_prefix('/') {
        Some(rooted) => normalize_path(&root_dir.join(rooted)),
        None => resolve_target(file, target),
    };

    known.contains(&resolved) || resolved.exists()
}

/// Check every link of every file against the in-memory file set and the filesystem.
/// Root-relative URLs (`/x.md`) resolve against `root_dir`.
pub fn validate_links(files: &BTreeMap<PathBuf, String>, root_dir: &Path) -> LinkReport {
    let known: HashSet<PathBuf> = files.keys().map(|p| normalize_path(p)).collect();
    let mut report = LinkReport::default();

    for (file, content) in files {
        let file = normalize_path(file);
        for link in links::find_internal_links(content) {
            if !link.is_internal {
                report.external.push(LinkRef::new(&file, link));
            } else if link_resolves(&file, &link, &known, root_dir) {
                report.valid.push(LinkRef::new(&file, link));
            } else {
                report.broken.push(LinkRef::new(&file, link));
            }
        }
    }

    report
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub from: PathBuf,
    pub to: PathBuf,
    pub permanent: bool,
}

/// One redirect per mapping, in plan order.
pub fn generate_redirects(mappings: &[MigrationMapping], permanent: bool) -> Vec<Redirect> {
    mappings
        .iter()
        .map(|m| Redirect {
            from: m.old_path.clone(),
            to: m.new_path.clone(),
            permanent,
        })
        .collect()
}

/// Prefix `content` with a DEPRECATED notice pointing at `new_location`.
pub fn insert_deprecation_notice(content: &str, new_location: &str) -> String {
    format!(
        "> **DEPRECATED**: This document has moved to [{new_location}]({new_location}).\n\
         > Please update your bookmarks and links.\n\n{content}"
    )
}

/// Full content for a stub left at `old_path` after a move.
pub fn create_deprecation_file(old_path: &str, new_path: &str) -> String {
    format!(
        "# Moved\n\n\
         > **DEPRECATED**: This page is no longer maintained here.\n\n\
         The content previously at `{old_path}` now lives at [{new_path}]({new_path}).\n\n\
         Please update your bookmarks and any links that point to this page.\n"
    )
}
