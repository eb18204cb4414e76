//! Overlay configuration: which payload fields go where on which page.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::OverlayError;

pub const DEFAULT_FONT_SIZE: f32 = 10.0;
pub const DEFAULT_PRINT_PATTERN: &str = "X";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// A mark printed only when the field value equals `if_value`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConditionalCoordinate {
    pub if_value: Value,
    #[serde(rename = "x-coordinate")]
    pub x: f32,
    #[serde(rename = "y-coordinate")]
    pub y: f32,
    #[serde(default)]
    pub print_pattern: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariableConfig {
    pub name: String,
    #[serde(rename = "x-coordinate", default)]
    pub x: Option<f32>,
    #[serde(rename = "y-coordinate", default)]
    pub y: Option<f32>,
    #[serde(default)]
    pub font_size: Option<f32>,
    #[serde(default)]
    pub align: Align,
    #[serde(default)]
    pub conditional_coordinates: Vec<ConditionalCoordinate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageConfig {
    /// Zero-based page index in the template.
    pub page_number: u32,
    #[serde(default)]
    pub variables: Vec<VariableConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct OverlayConfig {
    pub pages: Vec<PageConfig>,
}

/// One piece of text resolved against a payload, ready to be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPlacement {
    pub page_number: u32,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub align: Align,
}

impl OverlayConfig {
    pub fn from_json(raw: &str) -> Result<Self, OverlayError> {
        let config: OverlayConfig = serde_json::from_str(raw)
            .map_err(|e| OverlayError::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), OverlayError> {
        for page in &self.pages {
            for variable in &page.variables {
                if variable.name.is_empty() {
                    return Err(OverlayError::InvalidConfiguration(format!(
                        "page {}: variable name must not be empty",
                        page.page_number
                    )));
                }
                if let Some(size) = variable.font_size {
                    if !(size.is_finite() && size > 0.0) {
                        return Err(OverlayError::InvalidConfiguration(format!(
                            "variable '{}': font_size must be positive",
                            variable.name
                        )));
                    }
                }
                let positioned = variable.x.is_some() && variable.y.is_some();
                if !positioned && variable.conditional_coordinates.is_empty() {
                    return Err(OverlayError::InvalidConfiguration(format!(
                        "variable '{}' needs x-coordinate and y-coordinate or conditional_coordinates",
                        variable.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Resolve every configured variable against `payload`.
    ///
    /// Fails on the first variable whose name the payload lacks.
    pub fn placements(&self, payload: &Map<String, Value>) -> Result<Vec<TextPlacement>, OverlayError> {
        let mut placements = Vec::new();

        for page in &self.pages {
            for variable in &page.variables {
                let value = payload
                    .get(&variable.name)
                    .ok_or_else(|| OverlayError::KeyNotFound(variable.name.clone()))?;
                let text = display_value(value);
                let font_size = variable.font_size.unwrap_or(DEFAULT_FONT_SIZE);

                if variable.conditional_coordinates.is_empty() {
                    if let (Some(x), Some(y)) = (variable.x, variable.y) {
                        placements.push(TextPlacement {
                            page_number: page.page_number,
                            text,
                            x,
                            y,
                            font_size,
                            align: variable.align,
                        });
                    }
                    continue;
                }

                for condition in &variable.conditional_coordinates {
                    if display_value(&condition.if_value) != text {
                        continue;
                    }
                    placements.push(TextPlacement {
                        page_number: page.page_number,
                        text: condition
                            .print_pattern
                            .clone()
                            .unwrap_or_else(|| DEFAULT_PRINT_PATTERN.to_string()),
                        x: condition.x,
                        y: condition.y,
                        font_size,
                        align: variable.align,
                    });
                }
            }
        }

        Ok(placements)
    }
}

/// Text drawn for a payload value.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
