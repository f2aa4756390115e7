//! Schema validation for [`Metadata`].
//!
//! Every rule is checked; the report lists all violations in rule order.

use super::{concepts::is_concept, Metadata, CATEGORIES, CHAPTERS};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::LazyLock;

static RE_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").unwrap());

static RE_EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@<>]+@[^\s@<>]+\.[^\s@<>]+$").unwrap());

static RE_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").unwrap());

const MAX_LABEL: usize = 100;
const MAX_DESCRIPTION: usize = 300;
const MIN_DESCRIPTION_STRICT: usize = 20;
const MAX_DETAILS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    /// Used by `build`: enforces a minimum description length.
    #[default]
    Strict,
    Lenient,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.errors.join("; "))
    }
}

impl std::error::Error for ValidationReport {}

/// Report order; violations of one field stay together.
const FIELD_ORDER: &[&str] = &[
    "name",
    "label",
    "description",
    "details",
    "version",
    "category",
    "chapter",
    "concepts",
    "authors",
    "has_ui",
];

#[derive(Debug)]
struct Violation {
    field: &'static str,
    message: String,
}

impl Violation {
    fn new(field: &'static str, message: String) -> Self {
        Self { field, message }
    }

    fn wrong_type(field: &'static str, path: &str, expected: &str) -> Self {
        Self::new(field, format!("{path}: must be {expected}"))
    }
}

pub fn validate(meta: &Metadata, profile: Profile) -> Result<(), ValidationReport> {
    finish(check(meta, profile))
}

/// Validate a raw persisted record. A field of the wrong JSON type is a
/// violation of that field's rule, never coerced to a default.
pub fn validate_value(value: &Value, profile: Profile) -> Result<(), ValidationReport> {
    let mut typed: Vec<Violation> = Vec::new();
    let mut text = |field: &'static str, optional: bool| match value.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        None => None,
        Some(Value::Null) if optional => None,
        Some(_) => {
            typed.push(Violation::wrong_type(field, field, "a string"));
            None
        }
    };

    let meta = Metadata {
        name: text("name", false).unwrap_or_default(),
        label: text("label", false).unwrap_or_default(),
        description: text("description", false).unwrap_or_default(),
        details: text("details", true),
        version: text("version", true),
        category: text("category", false).unwrap_or_default(),
        chapter: text("chapter", false).unwrap_or_default(),
        ..Default::default()
    };

    // concepts and authors are checked here element by element
    let mut violations: Vec<Violation> = check(&meta, profile)
        .into_iter()
        .filter(|v| v.field != "concepts" && v.field != "authors")
        .filter(|v| !typed.iter().any(|t| t.field == v.field))
        .collect();
    violations.append(&mut typed);
    check_concept_values(value.get("concepts"), &mut violations);
    check_author_values(value.get("authors"), &mut violations);
    if !matches!(value.get("has_ui"), None | Some(Value::Bool(_))) {
        violations.push(Violation::wrong_type("has_ui", "has_ui", "a boolean"));
    }

    violations.sort_by_key(|v| FIELD_ORDER.iter().position(|f| *f == v.field));
    finish(violations)
}

fn check_concept_values(concepts: Option<&Value>, out: &mut Vec<Violation>) {
    match concepts {
        None | Some(Value::Null) => {}
        Some(Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                match item.as_str() {
                    Some(concept) => out.extend(concept_error(concept)),
                    None => out.push(Violation::wrong_type(
                        "concepts",
                        &format!("concepts[{i}]"),
                        "a string",
                    )),
                }
            }
        }
        Some(_) => out.push(Violation::wrong_type(
            "concepts",
            "concepts",
            "an array of strings",
        )),
    }
}

fn check_author_values(authors: Option<&Value>, out: &mut Vec<Violation>) {
    let items = match authors {
        None | Some(Value::Null) => &[][..],
        Some(Value::Array(items)) => items.as_slice(),
        Some(_) => {
            out.push(Violation::wrong_type("authors", "authors", "an array"));
            return;
        }
    };
    if items.is_empty() {
        out.push(no_authors());
    }
    for (i, item) in items.iter().enumerate() {
        let Some(entry) = item.as_object() else {
            out.push(Violation::wrong_type("authors", &format!("authors[{i}]"), "an object"));
            continue;
        };
        let field = |key: &str, optional: bool| match entry.get(key) {
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            None => Ok(None),
            Some(Value::Null) if optional => Ok(None),
            Some(_) => Err(Violation::wrong_type(
                "authors",
                &format!("authors[{i}].{key}"),
                "a string",
            )),
        };
        match field("name", false) {
            Ok(name) => out.extend(author_name_error(i, name.unwrap_or_default())),
            Err(v) => out.push(v),
        }
        match field("email", true) {
            Ok(email) => out.extend(email.and_then(|e| author_email_error(i, e))),
            Err(v) => out.push(v),
        }
        match field("url", true) {
            Ok(url) => out.extend(url.and_then(|u| author_url_error(i, u))),
            Err(v) => out.push(v),
        }
    }
}

fn finish(violations: Vec<Violation>) -> Result<(), ValidationReport> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationReport {
            errors: violations.into_iter().map(|v| v.message).collect(),
        })
    }
}

fn concept_error(concept: &str) -> Option<Violation> {
    (!is_concept(concept)).then(|| {
        Violation::new(
            "concepts",
            format!("concepts: \"{concept}\" is not a known concept"),
        )
    })
}

fn no_authors() -> Violation {
    Violation::new("authors", "authors: at least one author is required".to_string())
}

fn author_name_error(i: usize, name: &str) -> Option<Violation> {
    name.trim()
        .is_empty()
        .then(|| Violation::new("authors", format!("authors[{i}].name: must not be empty")))
}

fn author_email_error(i: usize, email: &str) -> Option<Violation> {
    (!RE_EMAIL.is_match(email)).then(|| {
        Violation::new(
            "authors",
            format!("authors[{i}].email: \"{email}\" is not a valid email"),
        )
    })
}

fn author_url_error(i: usize, url: &str) -> Option<Violation> {
    (!RE_URL.is_match(url)).then(|| {
        Violation::new(
            "authors",
            format!("authors[{i}].url: \"{url}\" is not a valid URL"),
        )
    })
}

fn check(meta: &Metadata, profile: Profile) -> Vec<Violation> {
    let mut errors = Vec::new();

    // 1
    if meta.name.is_empty() {
        errors.push(Violation::new("name", "name: must not be empty".to_string()));
    } else if !RE_NAME.is_match(&meta.name) {
        errors.push(Violation::new(
            "name",
            format!(
                "name: \"{}\" must contain only lowercase letters, digits and '-'",
                meta.name
            ),
        ));
    }

    // 2
    let label_len = meta.label.chars().count();
    if label_len == 0 {
        errors.push(Violation::new("label", "label: must not be empty".to_string()));
    } else if label_len > MAX_LABEL {
        errors.push(Violation::new(
            "label",
            format!("label: {label_len} characters exceeds {MAX_LABEL}"),
        ));
    }

    // 3
    let desc_len = meta.description.chars().count();
    let description = if desc_len == 0 {
        Some("description: must not be empty".to_string())
    } else if desc_len > MAX_DESCRIPTION {
        Some(format!(
            "description: {desc_len} characters exceeds {MAX_DESCRIPTION}"
        ))
    } else if profile == Profile::Strict && desc_len < MIN_DESCRIPTION_STRICT {
        Some(format!(
            "description: {desc_len} characters is shorter than {MIN_DESCRIPTION_STRICT}"
        ))
    } else {
        None
    };
    errors.extend(description.map(|m| Violation::new("description", m)));

    if let Some(details) = &meta.details {
        let len = details.chars().count();
        if len > MAX_DETAILS {
            errors.push(Violation::new(
                "details",
                format!("details: {len} characters exceeds {MAX_DETAILS}"),
            ));
        }
    }

    // 4, 5
    if !CATEGORIES.contains(&meta.category.as_str()) {
        errors.push(Violation::new(
            "category",
            format!(
                "category: \"{}\" is not one of {}",
                meta.category,
                CATEGORIES.join(", ")
            ),
        ));
    }
    if !CHAPTERS.contains(&meta.chapter.as_str()) {
        errors.push(Violation::new(
            "chapter",
            format!(
                "chapter: \"{}\" is not one of {}",
                meta.chapter,
                CHAPTERS.join(", ")
            ),
        ));
    }

    // 6
    for concept in meta.concepts.iter().flatten() {
        errors.extend(concept_error(concept));
    }

    // 7
    if meta.authors.is_empty() {
        errors.push(no_authors());
    }
    for (i, author) in meta.authors.iter().enumerate() {
        errors.extend(author_name_error(i, &author.name));
        errors.extend(author.email.as_deref().and_then(|e| author_email_error(i, e)));
        errors.extend(author.url.as_deref().and_then(|u| author_url_error(i, u)));
    }

    errors
}
