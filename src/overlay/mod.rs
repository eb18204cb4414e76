//! Text overlay: draw payload values onto an existing PDF template.
//!
//! - `config` - overlay configuration and value resolution
//! - `font` - font embedding and text encoding
//! - `writer` - page content and resource updates

pub mod config;
pub mod font;
mod writer;

use lopdf::Document;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::Write;

pub use config::{Align, OverlayConfig, TextPlacement};
pub use font::FontEncoder;

#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("Key not found: {0}")]
    KeyNotFound(String),
    #[error("invalid overlay configuration: {0}")]
    InvalidConfiguration(String),
    #[error("configuration references page {page_number} but the template has {page_count} page(s)")]
    PageOutOfRange { page_number: u32, page_count: usize },
    #[error("invalid font: {0}")]
    Font(String),
    #[error("malformed template page: {0}")]
    MalformedPage(String),
    #[error("invalid PDF template: {0}")]
    Pdf(#[from] lopdf::Error),
}

/// A template with the overlay applied, ready to be written out.
pub struct FilledPdf {
    document: Document,
}

impl FilledPdf {
    pub fn write_to<W: Write>(&mut self, target: &mut W) -> Result<(), OverlayError> {
        self.document.save_to(target)?;
        Ok(())
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}

/// Overlay the values of `payload` onto `template` as described by `config`,
/// drawing every value with the font in `font`.
pub fn fill(
    template: &[u8],
    config: &OverlayConfig,
    payload: &Map<String, Value>,
    font: &[u8],
) -> Result<FilledPdf, OverlayError> {
    let placements = config.placements(payload)?;
    let mut encoder = FontEncoder::parse(font)?;
    let mut document = Document::load_mem(template)?;

    let pages = document.get_pages();
    let mut by_page: BTreeMap<u32, Vec<&TextPlacement>> = BTreeMap::new();
    for placement in &placements {
        by_page.entry(placement.page_number).or_default().push(placement);
    }

    let mut targets = Vec::with_capacity(by_page.len());
    for (page_number, page_placements) in by_page {
        let page_id = page_number
            .checked_add(1)
            .and_then(|number| pages.get(&number))
            .copied()
            .ok_or(OverlayError::PageOutOfRange {
                page_number,
                page_count: pages.len(),
            })?;
        targets.push((page_id, page_placements));
    }

    if targets.is_empty() {
        log::debug!("No overlay placements resolved; returning template unchanged");
        return Ok(FilledPdf { document });
    }

    let font_id = document.new_object_id();
    for (page_id, page_placements) in targets {
        let font_name = writer::add_font_resource(&mut document, page_id, font_id)?;
        let operations = writer::text_operations(&page_placements, &font_name, &mut encoder);
        writer::append_page_content(&mut document, page_id, operations)?;
    }
    encoder.write_objects(&mut document, font_id);

    log::debug!(
        "Overlaid {} placement(s) using {} glyph(s)",
        placements.len(),
        encoder.used_glyph_count()
    );

    Ok(FilledPdf { document })
}
