//! JSON renderer, structured output for tooling integration.
//!
//! Serializes `{ metadata, entities }` directly.

use crate::render::{Document, RenderError, Renderer};
use serde_json::json;

pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, doc: &Document) -> Result<String, RenderError> {
        let value = json!({
            "metadata": doc.metadata,
            "entities": doc.entities,
        });
        let mut out = serde_json::to_string_pretty(&value)?;
        out.push('\n');
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "json"
    }
}
