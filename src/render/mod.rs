//! Renderer module, trait-based format dispatch.

pub mod json;
pub mod template;

use crate::metadata::Metadata;
use crate::model::SourceEntity;
use std::path::PathBuf;
use thiserror::Error;

pub use template::{read_template, render_document, TemplateRenderer, DEFAULT_TEMPLATE};

/// Everything a renderer sees: the metadata record and the entities of one file.
#[derive(Debug, Clone, Copy)]
pub struct Document<'a> {
    pub metadata: &'a Metadata,
    pub entities: &'a [SourceEntity],
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unknown format: {0}. Use markdown or json")]
    UnknownFormat(String),
    #[error("template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),
    #[error("failed to read template {}: {source}", .path.display())]
    ReadTemplate {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid template: {0}")]
    Template(#[from] handlebars::TemplateError),
    #[error("template rendering failed: {0}")]
    Render(#[from] handlebars::RenderError),
    #[error("failed to serialize document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Trait for rendering a Document into a specific output format.
pub trait Renderer {
    fn render(&self, doc: &Document) -> Result<String, RenderError>;
    fn file_extension(&self) -> &str;
}

/// Create a renderer for the given format name. `template` only applies to markdown.
pub fn create_renderer(
    format: &str,
    template: Option<String>,
) -> Result<Box<dyn Renderer>, RenderError> {
    match format {
        "markdown" | "md" => Ok(Box::new(TemplateRenderer::new(
            template.unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
        ))),
        "json" => Ok(Box::new(json::JsonRenderer)),
        _ => Err(RenderError::UnknownFormat(format.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch() {
        assert_eq!(create_renderer("md", None).unwrap().file_extension(), "md");
        assert_eq!(create_renderer("json", None).unwrap().file_extension(), "json");
        assert!(matches!(
            create_renderer("html", None),
            Err(RenderError::UnknownFormat(_))
        ));
    }
}
