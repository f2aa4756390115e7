//! Metadata synthesis from contract tags, external defaults and detected concepts.

use super::{Author, Metadata};
use crate::model::{EntityKind, SourceEntity, TagRecord};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use thiserror::Error;

static RE_EMAIL_PART: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<([^>]*)>").unwrap());

static RE_URL_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(?(https?://[^\s)]+)\)?").unwrap());

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("cannot determine starter name: no name supplied and no contract declaration found")]
    UnresolvableName,
}

/// Values supplied from outside the source: CLI flags or `natdoc.toml`.
///
/// Unknown keys in the config file are ignored rather than merged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetadataDefaults {
    pub name: Option<String>,
    pub category: Option<String>,
    pub chapter: Option<String>,
    pub authors: Vec<Author>,
}

/// Build a metadata record. Fields the schema requires are always present;
/// invalid values are left for [`super::validate`] to report.
pub fn synthesize(
    contract: Option<&SourceEntity>,
    defaults: &MetadataDefaults,
    concepts: &[String],
    operations: &[String],
) -> Result<Metadata, SynthesisError> {
    let empty = TagRecord::default();
    let contract = contract.filter(|e| e.kind == EntityKind::Contract);
    let tags = contract.map_or(&empty, |c| &c.docs);
    let contract_name = contract.map(|c| c.name.as_str());

    let name = non_empty(defaults.name.as_deref())
        .or_else(|| non_empty(tags.custom("name")))
        .map(str::to_string)
        .or_else(|| contract_name.map(kebab_case))
        .filter(|n| !n.is_empty())
        .ok_or(SynthesisError::UnresolvableName)?;

    let label = tags
        .title
        .clone()
        .or_else(|| contract_name.map(str::to_string))
        .unwrap_or_else(|| name.clone());

    let details = tags
        .custom("details")
        .map(str::to_string)
        .or_else(|| (!tags.dev.notes.is_empty()).then(|| tags.dev.notes.join(" ")));

    let concepts = match tags.custom("concepts") {
        Some(list) => split_list(list),
        None => concepts.to_vec(),
    };

    let mut extra_tags = tags.custom("tags").map(split_list).unwrap_or_default();
    for op in operations {
        if !extra_tags.contains(op) {
            extra_tags.push(op.clone());
        }
    }

    let mut authors: Vec<Author> = tags.authors.iter().map(|a| parse_author(a)).collect();
    if authors.is_empty() {
        authors = defaults.authors.clone();
    }

    let has_ui = tags
        .custom("has-ui")
        .or_else(|| tags.custom("has_ui"))
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));

    Ok(Metadata {
        name,
        label,
        description: tags.notice.clone().unwrap_or_default(),
        details,
        version: tags.custom("version").map(str::to_string),
        category: pick(tags.custom("category"), defaults.category.as_deref()),
        chapter: pick(tags.custom("chapter"), defaults.chapter.as_deref()),
        concepts: (!concepts.is_empty()).then_some(concepts),
        tags: (!extra_tags.is_empty()).then_some(extra_tags),
        authors,
        has_ui,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn pick(tag: Option<&str>, default: Option<&str>) -> String {
    non_empty(tag).or(non_empty(default)).unwrap_or_default().to_string()
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `Name <email> https://url` (both extras optional).
pub fn parse_author(raw: &str) -> Author {
    let email = RE_EMAIL_PART
        .captures(raw)
        .map(|c| c[1].trim().to_string())
        .filter(|e| !e.is_empty());
    let url = RE_URL_PART.captures(raw).map(|c| c[1].to_string());
    let rest = RE_EMAIL_PART.replace_all(raw, "");
    let rest = RE_URL_PART.replace_all(&rest, "");
    Author {
        name: rest.split_whitespace().collect::<Vec<_>>().join(" "),
        email,
        url,
    }
}

/// `FHECounter` → `fhe-counter`, `ConfidentialERC20Wrapper` → `confidential-erc20-wrapper`.
pub fn kebab_case(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !out.ends_with('-') && !out.is_empty() {
                out.push('-');
            }
            continue;
        }
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || ((prev.is_uppercase() || prev.is_ascii_digit()) && next_lower);
            if boundary && !out.ends_with('-') {
                out.push('-');
            }
        }
        out.extend(c.to_lowercase());
    }
    out.trim_matches('-').to_string()
}
