//! Just enough markdown structure for classification, adaptation and scoring:
//! ATX headings, fenced code blocks and a leading frontmatter block.

use regex::Regex;
use std::sync::LazyLock;

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+?)(?:\s+#+)?\s*$").expect("heading pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub line: usize,
    pub level: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// 1-based line of the opening fence
    pub line: usize,
    pub language: String,
    pub code: String,
}

pub(crate) fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

/// Headings outside fenced code, in document order.
pub fn headings(content: &str) -> Vec<Heading> {
    let mut found = Vec::new();
    let mut in_fence = false;

    for (i, line) in content.lines().enumerate() {
        if is_fence(line) {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(caps) = HEADING_RE.captures(line) {
            found.push(Heading {
                line: i + 1,
                level: caps.get(1).map(|m| m.as_str().len()).unwrap_or(1),
                text: caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
            });
        }
    }

    found
}

/// Closed fenced code blocks. An unterminated fence at the end is dropped.
pub fn code_blocks(content: &str) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<CodeBlock> = None;

    for (i, line) in content.lines().enumerate() {
        if is_fence(line) {
            match current.take() {
                Some(block) => blocks.push(block),
                None => {
                    current = Some(CodeBlock {
                        line: i + 1,
                        language: line.trim_start()[3..].trim().to_string(),
                        code: String::new(),
                    });
                }
            }
        } else if let Some(block) = current.as_mut() {
            block.code.push_str(line);
            block.code.push('\n');
        }
    }

    blocks
}

/// Split a leading `---` delimited block off the document.
/// Returns the block body and the byte offset where the document proper starts.
pub fn frontmatter(content: &str) -> Option<(&str, usize)> {
    let rest = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))?;
    let start = content.len() - rest.len();

    let mut offset = start;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let body = &content[start..offset];
            return Some((body.trim_end_matches(['\n', '\r']), offset + line.len()));
        }
        offset += line.len();
    }

    None
}

/// Byte offset just past the first `# ` title line outside frontmatter and code.
pub fn title_line_end(content: &str) -> Option<usize> {
    let body_start = frontmatter(content).map(|(_, end)| end).unwrap_or(0);
    let mut offset = body_start;
    let mut in_fence = false;

    for line in content[body_start..].split_inclusive('\n') {
        if is_fence(line) {
            in_fence = !in_fence;
        } else if !in_fence && line.starts_with("# ") {
            return Some(offset + line.len());
        }
        offset += line.len();
    }

    None
}
