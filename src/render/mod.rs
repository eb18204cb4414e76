//! Fill a stored template with request data and hand back the PDF.
//!
//! lookup → read files → overlay → write `<uuid>.pdf` → read back → delete.

pub mod handlers;
pub mod models;
pub mod request_parser;

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use serde_json::{Map, Value};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::config::RenderSettings;
use crate::overlay::{self, OverlayConfig, OverlayError};
use crate::template::{resolve_site_path, FontRecord, StoreError, TemplateRecord};
use crate::{AppState, ErrorResponse};

/// Name the rendered document is offered under.
pub const DOWNLOAD_FILENAME: &str = "response.pdf";

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Could not find data for template ID: {0}")]
    TemplateNotFound(String),
    #[error("Could not find font: {font}")]
    FontNotFound { template_id: String, font: String },
    #[error("{message}")]
    InvalidConfiguration { template_id: String, message: String },
    #[error("File not found: {0}")]
    FileNotFound(String),
    #[error("Key not found ")]
    KeyNotFound(String),
    #[error("Failed to render PDF: {0}")]
    Overlay(#[source] OverlayError),
    #[error("Failed to load template records: {0}")]
    Store(#[from] StoreError),
    #[error("Failed to handle rendered PDF: {0}")]
    Output(#[source] std::io::Error),
    #[error("Render task failed: {0}")]
    Blocking(String),
}

impl RenderError {
    fn from_overlay(template_id: &str, error: OverlayError) -> Self {
        match error {
            OverlayError::KeyNotFound(key) => RenderError::KeyNotFound(key),
            OverlayError::InvalidConfiguration(message) => RenderError::InvalidConfiguration {
                template_id: template_id.to_string(),
                message,
            },
            other => RenderError::Overlay(other),
        }
    }
}

impl ResponseError for RenderError {
    fn status_code(&self) -> StatusCode {
        match self {
            RenderError::TemplateNotFound(_)
            | RenderError::FontNotFound { .. }
            | RenderError::InvalidConfiguration { .. }
            | RenderError::FileNotFound(_)
            | RenderError::KeyNotFound(_) => StatusCode::BAD_REQUEST,
            RenderError::Overlay(_)
            | RenderError::Store(_)
            | RenderError::Output(_)
            | RenderError::Blocking(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = self.to_string();
        let body = match self {
            RenderError::TemplateNotFound(template_id)
            | RenderError::FontNotFound { template_id, .. }
            | RenderError::InvalidConfiguration { template_id, .. } => {
                ErrorResponse::from_message(&error).with_template_id(template_id)
            }
            RenderError::KeyNotFound(key) => {
                ErrorResponse::new(&error, &format!("Key not found: {}", key)).with_key(key)
            }
            _ => ErrorResponse::from_message(&error),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

/// A filled template sitting in the output directory.
///
/// The file is removed when this value is dropped.
pub struct RenderedPdf {
    file: NamedTempFile,
}

impl RenderedPdf {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Read the document back and delete the file.
    pub fn into_bytes(self) -> Result<Vec<u8>, RenderError> {
        let bytes = fs::read(self.file.path()).map_err(RenderError::Output)?;
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            log::warn!("Failed to delete rendered file {}: {}", path.display(), e);
        }
        Ok(bytes)
    }
}

/// Look up `template_id`, overlay `payload` onto it and write the result to a temporary file.
pub async fn fill_pdf_form(
    state: &AppState,
    template_id: &str,
    payload: Map<String, Value>,
) -> Result<RenderedPdf, RenderError> {
    let mut records = state.store.find_templates(template_id).await?;
    if records.len() != 1 {
        log::warn!(
            "Expected one template record for '{}', found {}",
            template_id,
            records.len()
        );
        return Err(RenderError::TemplateNotFound(template_id.to_string()));
    }
    let record = records.remove(0);

    let font = state
        .store
        .find_font(&record.font)
        .await?
        .ok_or_else(|| RenderError::FontNotFound {
            template_id: template_id.to_string(),
            font: record.font.clone(),
        })?;

    let settings = state.render.clone();
    let template_id = template_id.to_string();
    web::block(move || render_to_file(&settings, &template_id, &record, &font, &payload))
        .await
        .map_err(|e| RenderError::Blocking(e.to_string()))?
}

fn read_site_file(base: &Path, record_path: &str) -> Result<Vec<u8>, RenderError> {
    let path: PathBuf = resolve_site_path(base, record_path)
        .ok_or_else(|| RenderError::FileNotFound(record_path.to_string()))?;
    fs::read(&path).map_err(|e| {
        log::error!("Failed to read {}: {}", path.display(), e);
        RenderError::FileNotFound(record_path.to_string())
    })
}

/// Blocking part of the pipeline: file reads, overlay and output write.
pub fn render_to_file(
    settings: &RenderSettings,
    template_id: &str,
    record: &TemplateRecord,
    font: &FontRecord,
    payload: &Map<String, Value>,
) -> Result<RenderedPdf, RenderError> {
    let font_bytes = read_site_file(&settings.site_base_path, &font.font_name)?;
    let template_bytes = read_site_file(&settings.site_base_path, &record.template)?;

    let config = OverlayConfig::from_json(&record.configuration)
        .map_err(|e| RenderError::from_overlay(template_id, e))?;

    let mut filled = overlay::fill(&template_bytes, &config, payload, &font_bytes)
        .map_err(|e| RenderError::from_overlay(template_id, e))?;

    let prefix = Uuid::new_v4().to_string();
    let mut file = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".pdf")
        .rand_bytes(0)
        .tempfile_in(&settings.output_dir)
        .map_err(RenderError::Output)?;

    {
        let mut writer = BufWriter::new(file.as_file_mut());
        filled
            .write_to(&mut writer)
            .map_err(|e| RenderError::from_overlay(template_id, e))?;
        writer.flush().map_err(RenderError::Output)?;
    }

    log::debug!(
        "Rendered template '{}' to {}",
        template_id,
        file.path().display()
    );

    Ok(RenderedPdf { file })
}
