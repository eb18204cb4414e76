use serde::{Deserialize, Serialize};

/// A stored PDF template as written by the admin side.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TemplateRecord {
    pub template_id: String,
    /// Template PDF path, relative to the site base path.
    pub template: String,
    /// Overlay configuration as JSON text.
    pub configuration: String,
    /// Name of the [`FontRecord`] used for every overlaid value.
    pub font: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FontRecord {
    pub name: String,
    /// Font file path, relative to the site base path.
    pub font_name: String,
}
