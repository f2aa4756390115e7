//! Build/publish orchestration.
//!
//! `build` walks a draft through
//! `Verifying → Detecting → ExtractingMetadata → Validating → Rendering → Packaging`
//! and `publish` copies a finished dist into the catalog. Every stage can abort
//! with a [`PipelineError`] naming the stage and listing every known cause.

mod build;
mod fs;
mod publish;

use crate::metadata::Metadata;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use build::build;
pub use publish::publish;

/// File name of the rendered document inside dist.
pub const README_FILE: &str = "README.md";
/// Per-draft template override.
pub const DRAFT_TEMPLATE: &str = "README.md.hbs";
pub const CONTRACTS_DIR: &str = "contracts";
pub const TEST_DIR: &str = "test";
pub const DIST_DIR: &str = "dist";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Verifying,
    Detecting,
    ExtractingMetadata,
    Validating,
    Rendering,
    Packaging,
    Publishing,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Verifying => "verifying",
            Stage::Detecting => "detecting",
            Stage::ExtractingMetadata => "extracting metadata",
            Stage::Validating => "validating",
            Stage::Rendering => "rendering",
            Stage::Packaging => "packaging",
            Stage::Publishing => "publishing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An aborted pipeline run.
#[derive(Debug, Error)]
#[error("{stage}: {reason}")]
pub struct PipelineError {
    pub stage: Stage,
    pub reason: String,
    /// Every cause known at the time of the abort.
    pub errors: Vec<String>,
}

impl PipelineError {
    pub fn new(stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            reason: reason.into(),
            errors: Vec::new(),
        }
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }

    pub(crate) fn io(stage: Stage, path: &Path, err: std::io::Error) -> Self {
        Self::new(stage, "I/O error").with_errors(vec![format!("{}: {}", path.display(), err)])
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Defaults to `<draft>/dist`.
    pub output_path: Option<PathBuf>,
    pub template_path: Option<PathBuf>,
    pub category: Option<String>,
    pub chapter: Option<String>,
    pub starter_name: Option<String>,
    /// Explicit contract file; relative paths resolve against the draft.
    pub contract: Option<PathBuf>,
    pub lenient: bool,
}

#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub dist: PathBuf,
    pub contract: PathBuf,
    /// Sidecar written into the draft.
    pub metadata_path: PathBuf,
    pub readme_path: PathBuf,
    pub metadata: Metadata,
    pub entity_count: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PublishOptions {
    pub force: bool,
    pub lenient: bool,
}

#[derive(Debug, Clone)]
pub struct PublishOutput {
    pub name: String,
    pub target: PathBuf,
    /// An existing entry was removed first.
    pub replaced: bool,
}
