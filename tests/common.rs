#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use pdfrender::config::RenderSettings;
use pdfrender::template::{FontRecord, StoreError, TemplateRecord, TemplateStore};
use pdfrender::AppState;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub const FONT_BYTES: &[u8] = include_bytes!("fixtures/DejaVuSansMono.ttf");

pub const TEMPLATE_ID: &str = "T-1";
pub const TEMPLATE_PATH: &str = "/private/files/form.pdf";
pub const FONT_NAME: &str = "DejaVu Sans Mono";
pub const FONT_PATH: &str = "/public/fonts/DejaVuSansMono.ttf";

/// Page 0 draws `full_name` and a conditional `gender` mark, page 1 a right-aligned `amount`.
pub const OVERLAY_CONFIG: &str = r#"[
    {"page_number": 0, "variables": [
        {"name": "full_name", "x-coordinate": 100, "y-coordinate": 700, "font_size": 12},
        {"name": "gender", "conditional_coordinates": [
            {"if_value": "male", "x-coordinate": 80, "y-coordinate": 500},
            {"if_value": "female", "x-coordinate": 140, "y-coordinate": 500}
        ]}
    ]},
    {"page_number": 1, "variables": [
        {"name": "amount", "x-coordinate": 500, "y-coordinate": 600, "align": "right"}
    ]}
]"#;

/// Two-page template. Both pages inherit a resource dictionary holding one
/// font named `font_name`; only the first page has content.
pub fn template_pdf_with_font_name(font_name: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let mut fonts = lopdf::Dictionary::new();
    fonts.set(font_name.as_bytes().to_vec(), Object::Reference(font_id));
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(font_name.as_bytes().to_vec()), 24i64.into()]),
            Operation::new("Td", vec![72i64.into(), 760i64.into()]),
            Operation::new("Tj", vec![Object::string_literal("Application form")]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

    let first = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let second = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
    });

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![Object::Reference(first), Object::Reference(second)],
        "Count" => 2i64,
        "Resources" => resources_id,
        "MediaBox" => vec![0i64.into(), 0i64.into(), 595i64.into(), 842i64.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

pub fn template_pdf() -> Vec<u8> {
    template_pdf_with_font_name("F1")
}

pub fn template_record(template_id: &str, template: &str, configuration: &str) -> TemplateRecord {
    TemplateRecord {
        template_id: template_id.to_string(),
        template: template.to_string(),
        configuration: configuration.to_string(),
        font: FONT_NAME.to_string(),
    }
}

pub fn font_record() -> FontRecord {
    FontRecord {
        name: FONT_NAME.to_string(),
        font_name: FONT_PATH.to_string(),
    }
}

/// In-memory template store.
#[derive(Default)]
pub struct MockTemplateStore {
    templates: HashMap<String, Vec<TemplateRecord>>,
    fonts: HashMap<String, FontRecord>,
    unavailable: bool,
}

impl MockTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding the standard `T-1` template and its font.
    pub fn standard() -> Self {
        Self::new()
            .with_template(template_record(TEMPLATE_ID, TEMPLATE_PATH, OVERLAY_CONFIG))
            .with_font(font_record())
    }

    pub fn with_template(mut self, record: TemplateRecord) -> Self {
        self.templates
            .entry(record.template_id.clone())
            .or_default()
            .push(record);
        self
    }

    pub fn with_font(mut self, record: FontRecord) -> Self {
        self.fonts.insert(record.name.clone(), record);
        self
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }
}

#[async_trait::async_trait]
impl TemplateStore for MockTemplateStore {
    async fn find_templates(&self, template_id: &str) -> Result<Vec<TemplateRecord>, StoreError> {
        if self.unavailable {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(self.templates.get(template_id).cloned().unwrap_or_default())
    }

    async fn find_font(&self, name: &str) -> Result<Option<FontRecord>, StoreError> {
        if self.unavailable {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(self.fonts.get(name).cloned())
    }
}

/// A site directory holding the template and font files plus an empty output directory.
pub struct TestSite {
    pub site: TempDir,
    pub output: TempDir,
}

impl TestSite {
    pub fn new() -> Self {
        let site = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let test_site = Self { site, output };
        test_site.write_file(TEMPLATE_PATH, &template_pdf());
        test_site.write_file(FONT_PATH, FONT_BYTES);
        test_site
    }

    /// Write `contents` at a record-style path (leading `/` relative to the site).
    pub fn write_file(&self, record_path: &str, contents: &[u8]) {
        let path = self.site.path().join(record_path.trim_start_matches('/'));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    pub fn settings(&self) -> RenderSettings {
        RenderSettings::new(self.site.path(), self.output.path())
    }

    pub fn state(&self, store: MockTemplateStore) -> AppState {
        AppState::new_with_store(Arc::new(store), self.settings())
    }

    pub fn output_files(&self) -> Vec<std::path::PathBuf> {
        list_dir(self.output.path())
    }
}

pub fn list_dir(dir: &Path) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

/// Operators and operands of every content stream on `page_number` (1-based).
pub fn page_operations(doc: &Document, page_number: u32) -> Vec<Operation> {
    let page_id = doc.get_pages()[&page_number];
    let content = doc.get_page_content(page_id).unwrap();
    Content::decode(&content).unwrap().operations
}
