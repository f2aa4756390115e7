//! Doc-comment normalizer.
//!
//! Turns the raw text of a `/** ... */` block or a run of `///` lines into
//! trimmed content lines with the comment markers removed. Tags written
//! inline on one physical line (`/** @notice A. @param x B */`) are split into
//! one logical line per tag.

use regex::Regex;
use std::sync::LazyLock;

// Inline tag boundary: whitespace followed by a known tag name
static RE_INLINE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+@(?:title|author|notice|dev|param|returns?|name|type|field|value|inheritdoc|custom:)\b")
        .unwrap()
});

/// Surface syntax of a doc block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Form {
    /// `/** ... */` (plain `/* ... */` is tolerated)
    Block,
    /// Repeated `///` prefix
    Line,
}

fn detect_form(raw: &str) -> Option<Form> {
    let trimmed = raw.trim();
    if trimmed.starts_with("/*") {
        return Some(Form::Block);
    }
    let mut lines = trimmed.lines().map(str::trim).filter(|l| !l.is_empty()).peekable();
    lines.peek()?;
    if lines.all(|l| l.starts_with("///")) {
        Some(Form::Line)
    } else {
        None
    }
}

/// Normalize a raw doc block into content lines.
///
/// Returns an empty list when the text is neither form; missing docs are legal.
pub fn normalize(raw: &str) -> Vec<String> {
    let lines = match detect_form(raw) {
        Some(Form::Block) => normalize_block(raw.trim()),
        Some(Form::Line) => raw
            .lines()
            .filter_map(|l| l.trim().strip_prefix("///"))
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect(),
        None => return Vec::new(),
    };
    lines.iter().flat_map(|l| split_inline_tags(l)).collect()
}

fn split_inline_tags(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut start = 0;
    for m in RE_INLINE_TAG.find_iter(line) {
        let head = line[start..m.start()].trim();
        if !head.is_empty() {
            out.push(head.to_string());
        }
        start = m.start();
    }
    let tail = line[start..].trim();
    if !tail.is_empty() {
        out.push(tail.to_string());
    }
    out
}

fn normalize_block(text: &str) -> Vec<String> {
    let body = text
        .strip_prefix("/**")
        .or_else(|| text.strip_prefix("/*"))
        .unwrap_or(text);
    let body = body.strip_suffix("*/").unwrap_or(body);

    body.lines()
        .map(|line| {
            let line = line.trim();
            // Leading `*` gutters, but not `*/`-style leftovers such as `**bold**`
            let line = if line.starts_with("**") {
                line
            } else {
                line.strip_prefix('*').unwrap_or(line)
            };
            line.trim().to_string()
        })
        .filter(|l| !l.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_form() {
        let raw = "/**\n * @title Counter\n *\n * @notice Counts things.\n */";
        assert_eq!(normalize(raw), vec!["@title Counter", "@notice Counts things."]);
    }

    #[test]
    fn block_form_single_line() {
        assert_eq!(
            normalize("/** @notice Stores A. @param inputA value @param inputProof proof */"),
            vec!["@notice Stores A.", "@param inputA value", "@param inputProof proof"]
        );
    }

    #[test]
    fn email_in_author_is_not_split() {
        assert_eq!(
            normalize("/// @author Jane <jane@example.com>"),
            vec!["@author Jane <jane@example.com>"]
        );
    }

    #[test]
    fn line_form() {
        let raw = "    /// @notice Adds.\n    ///   continues here\n    ///\n";
        assert_eq!(normalize(raw), vec!["@notice Adds.", "continues here"]);
    }

    #[test]
    fn plain_comment_is_not_docs() {
        assert!(normalize("// just a note").is_empty());
        assert!(normalize("").is_empty());
        assert!(normalize("uint256 x;").is_empty());
    }

    #[test]
    fn block_without_gutter() {
        let raw = "/**\n  @notice No stars\n  here\n*/";
        assert_eq!(normalize(raw), vec!["@notice No stars", "here"]);
    }
}
