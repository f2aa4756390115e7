//! Starter metadata: the record persisted as `metadata.json`.

pub mod concepts;
pub mod synth;
pub mod validate;

use serde::{Deserialize, Serialize};

pub use concepts::{detect_concepts, detect_operations, CONCEPTS};
pub use synth::{synthesize, MetadataDefaults, SynthesisError};
pub use validate::{validate, validate_value, Profile, ValidationReport};

/// File name of the metadata sidecar.
pub const METADATA_FILE: &str = "metadata.json";

/// Allowed `category` values.
pub const CATEGORIES: &[&str] = &["fundamental", "patterns", "applied", "advanced"];

/// Allowed `chapter` values.
pub const CHAPTERS: &[&str] = &[
    "basics",
    "encryption",
    "decryption",
    "access-control",
    "input-proofs",
    "handles",
    "anti-patterns",
    "openzeppelin",
    "games",
    "defi",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    pub label: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub category: String,
    pub chapter: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concepts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub has_ui: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Metadata {
    /// Pretty-printed JSON with a trailing newline.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }
}
