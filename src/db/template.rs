//! Template and font record queries

use async_trait::async_trait;
use sqlx::PgPool;

use crate::template::{FontRecord, StoreError, TemplateRecord, TemplateStore};

pub struct PgTemplateStore {
    pool: PgPool,
}

impl PgTemplateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateStore for PgTemplateStore {
    async fn find_templates(&self, template_id: &str) -> Result<Vec<TemplateRecord>, StoreError> {
        let records = sqlx::query_as::<_, TemplateRecord>(
            "SELECT template_id, template, configuration, font FROM templates WHERE template_id = $1",
        )
        .bind(template_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn find_font(&self, name: &str) -> Result<Option<FontRecord>, StoreError> {
        let font = sqlx::query_as::<_, FontRecord>("SELECT name, font_name FROM fonts WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(font)
    }
}
