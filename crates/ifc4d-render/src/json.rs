//! Extraction as JSON

use ifc4d_core::{Extraction, RenderError, Renderer};

/// Pretty-printed JSON dump of the schedules and their rows
#[derive(Clone, Debug, Default)]
pub struct JsonRenderer;

impl JsonRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for JsonRenderer {
    type Output = String;

    fn render(&self, extraction: &Extraction) -> Result<String, RenderError> {
        serde_json::to_string_pretty(extraction).map_err(|e| RenderError::Format(e.to_string()))
    }
}
