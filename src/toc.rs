//! GitHub-flavored markdown anchor/slug generation for the function index.

use std::collections::HashMap;

/// Generate an index link for a heading.
pub fn render_toc_link(text: &str, anchor: &str) -> String {
    format!("[{}](#{})", text, anchor)
}

/// Generate an index list item.
pub fn render_toc_item(text: &str, anchor: &str) -> String {
    format!("* {}", render_toc_link(text, anchor))
}

/// GitHub heading anchor slug generation:
/// - lowercase
/// - remove all chars that aren't alphanumeric, space, underscore, or hyphen
/// - replace spaces with hyphens
pub fn github_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.to_lowercase().chars() {
        if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' {
            slug.push(c);
        }
    }
    slug.replace(' ', "-")
}

/// Hands out anchors for a sequence of headings in document order.
/// Repeated headings get `-1`, `-2`, ... suffixes the way GitHub numbers them.
#[derive(Debug, Default)]
pub struct Slugger {
    seen: HashMap<String, usize>,
}

impl Slugger {
    pub fn slug(&mut self, text: &str) -> String {
        let base = github_slug(text);
        let count = self.seen.entry(base.clone()).or_insert(0);
        let slug = if *count == 0 {
            base
        } else {
            format!("{}-{}", base, count)
        };
        *count += 1;
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_simple() {
        assert_eq!(github_slug("hello world"), "hello-world");
    }

    #[test]
    fn slug_strips_punctuation() {
        assert_eq!(github_slug("setA(externalEuint8, bytes)"), "setaexternaleuint8-bytes");
        assert_eq!(github_slug("FHE.add"), "fheadd");
    }

    #[test]
    fn slug_keeps_underscores_and_hyphens() {
        assert_eq!(github_slug("_setValue"), "_setvalue");
        assert_eq!(github_slug("access-control"), "access-control");
    }

    #[test]
    fn repeated_headings() {
        let mut slugger = Slugger::default();
        assert_eq!(slugger.slug("transfer"), "transfer");
        assert_eq!(slugger.slug("transfer"), "transfer-1");
        assert_eq!(slugger.slug("Transfer"), "transfer-2");
        assert_eq!(slugger.slug("approve"), "approve");
    }

    #[test]
    fn toc_item() {
        assert_eq!(
            render_toc_item("increment", "increment"),
            "* [increment](#increment)"
        );
    }
}
