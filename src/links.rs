use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use crate::markdown::is_fence;

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("link pattern"));

static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9+.-]*:").expect("scheme pattern"));

/// A markdown `[text](url)` occurrence.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub text: String,
    pub url: String,
    /// 1-based
    pub line: usize,
    /// 1-based character column of the opening `[`
    pub column: usize,
    pub is_internal: bool,
}

impl Link {
    pub fn is_anchor_only(&self) -> bool {
        self.url.starts_with('#')
    }

    /// The URL without any `#fragment` or `?query`.
    pub fn target(&self) -> &str {
        split_url(&self.url).0
    }
}

/// Split a URL into its path part and the `#...`/`?...` suffix.
pub fn split_url(url: &str) -> (&str, &str) {
    match url.find(['#', '?']) {
        Some(idx) => url.split_at(idx),
        None => (url, ""),
    }
}

/// Anything with a URI scheme prefix (`http:`, `mailto:`, `ftp:` ...) is external.
pub fn is_external(url: &str) -> bool {
    SCHEME_RE.is_match(url)
}

/// A link plus the byte range of its URL inside the scanned content.
#[derive(Debug, Clone)]
pub(crate) struct LinkSpan {
    pub link: Link,
    pub url_range: Range<usize>,
}

/// Links outside fenced code, with their URL byte ranges.
pub(crate) fn scan_links(content: &str) -> Vec<LinkSpan> {
    let mut spans = Vec::new();
    let mut offset = 0;
    let mut in_fence = false;

    for (i, line) in content.split('\n').enumerate() {
        let line_start = offset;
        offset += line.len() + 1;

        if is_fence(line) {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        for caps in LINK_RE.captures_iter(line) {
            let (Some(whole), Some(text), Some(url)) = (caps.get(0), caps.get(1), caps.get(2)) else {
                continue;
            };
            let url_str = url.as_str();
            spans.push(LinkSpan {
                link: Link {
                    text: text.as_str().to_string(),
                    url: url_str.to_string(),
                    line: i + 1,
                    column: line[..whole.start()].chars().count() + 1,
                    is_internal: !is_external(url_str),
                },
                url_range: line_start + url.start()..line_start + url.end(),
            });
        }
    }

    spans
}

/// Every markdown link outside fenced code, in document order, internal and
/// external alike. Malformed link syntax is skipped.
pub fn find_internal_links(content: &str) -> Vec<Link> {
    scan_links(content).into_iter().map(|s| s.link).collect()
}

/// Lexically normalize a path, folding `.` and `..` without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve a link target against the directory of the file containing it.
pub fn resolve_target(current_file: &Path, target: &str) -> PathBuf {
    let dir = current_file.parent().unwrap_or_else(|| Path::new(""));
    normalize_path(&dir.join(target))
}

/// Render a relative path with `/` separators, as markdown expects.
pub fn to_url_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Count of `[text](url)` occurrences, as used for effort estimates.
pub fn count_links(content: &str) -> usize {
    content
        .split('\n')
        .map(|line| LINK_RE.find_iter(line).count())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_mixed_links() {
        let content = "\n# Test Document\n\nThis is a [link to another doc](./other.md).\nHere is an [external link](https://example.com).\nAnd an [anchor link](#section).\n";
        let links = find_internal_links(content);

        assert_eq!(links.len(), 3);
        assert_eq!(links[0].text, "link to another doc");
        assert_eq!(links[0].url, "./other.md");
        assert!(links[0].is_internal);
        assert_eq!(links[0].line, 4);
        assert_eq!(links[0].column, 11);

        assert_eq!(links[1].url, "https://example.com");
        assert!(!links[1].is_internal);

        assert_eq!(links[2].url, "#section");
        assert!(links[2].is_internal);
        assert!(links[2].is_anchor_only());
    }

    #[test]
    fn test_scheme_classification() {
        for url in ["http://a.com", "https://a.com", "ftp://a.com", "mailto:x@y.z", "git+ssh:repo"] {
            assert!(is_external(url), "{url} should be external");
        }
        for url in ["./a.md", "../b.md", "sub/c.md", "#top", "/abs/d.md"] {
            assert!(!is_external(url), "{url} should be internal");
        }
    }

    #[test]
    fn test_malformed_links_skipped() {
        let content = "[no close](./a.md\n[](./empty.md)\n[ok](./ok.md)";
        let links = find_internal_links(content);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "./ok.md");
        assert_eq!(links[0].line, 3);
    }

    #[test]
    fn test_target_strips_fragment_and_query() {
        let links = find_internal_links("[a](./doc.md#section) [b](page.md?x=1)");
        assert_eq!(links[0].target(), "./doc.md");
        assert_eq!(links[1].target(), "page.md");
        assert_eq!(links[1].column, 23);
    }

    #[test]
    fn test_url_range_points_at_url() {
        let content = "intro\n see [x](a/b.md) and [y](c.md)";
        for span in scan_links(content) {
            assert_eq!(&content[span.url_range.clone()], span.link.url);
        }
    }

    #[test]
    fn test_links_in_fenced_code_skipped() {
        let content = "[a](a.md)\n```js\nhandlers[0](event)\n```\n[b](b.md)";
        let links = find_internal_links(content);
        let urls: Vec<&str> = links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, vec!["a.md", "b.md"]);
        assert_eq!(links[1].line, 5);
        for span in scan_links(content) {
            assert_eq!(&content[span.url_range.clone()], span.link.url);
        }
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target(Path::new("/docs/index.md"), "./old/guide.md"),
            PathBuf::from("/docs/old/guide.md")
        );
        assert_eq!(
            resolve_target(Path::new("/docs/a/b.md"), "../c.md"),
            PathBuf::from("/docs/c.md")
        );
        assert_eq!(
            resolve_target(Path::new("docs/a.md"), "../../x.md"),
            PathBuf::from("../x.md")
        );
    }

    #[test]
    fn test_count_links() {
        assert_eq!(count_links("[a](b) [c](d)\n[e](f)"), 3);
        assert_eq!(count_links("no links"), 0);
    }
}
