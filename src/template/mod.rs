//! Template and font records, and the storage seam used to look them up.
//!
//! Records are written by an external admin process; this service only reads them.

pub mod models;

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

pub use models::{FontRecord, TemplateRecord};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read access to template and font records.
#[async_trait]
pub trait TemplateStore {
    /// All template records carrying `template_id`. Callers expect exactly one.
    async fn find_templates(&self, template_id: &str) -> Result<Vec<TemplateRecord>, StoreError>;

    async fn find_font(&self, name: &str) -> Result<Option<FontRecord>, StoreError>;
}

/// Resolve a record path against the site base path.
///
/// A leading `/` is relative to the base. Returns `None` when the path would
/// climb out of the base directory.
pub fn resolve_site_path(base: &Path, record_path: &str) -> Option<PathBuf> {
    let mut resolved = base.to_path_buf();
    let mut depth = 0usize;

    for component in Path::new(record_path).components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                depth += 1;
            }
            Component::ParentDir => {
                if depth == 0 {
                    return None;
                }
                resolved.pop();
                depth -= 1;
            }
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }

    if depth == 0 {
        return None;
    }

    Some(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_slash_is_relative_to_base() {
        let base = Path::new("/srv/site");
        assert_eq!(
            resolve_site_path(base, "/private/files/form.pdf"),
            Some(PathBuf::from("/srv/site/private/files/form.pdf"))
        );
        assert_eq!(
            resolve_site_path(base, "public/fonts/Sans.ttf"),
            Some(PathBuf::from("/srv/site/public/fonts/Sans.ttf"))
        );
    }

    #[test]
    fn test_parent_dir_inside_base_allowed() {
        let base = Path::new("/srv/site");
        assert_eq!(
            resolve_site_path(base, "files/old/../form.pdf"),
            Some(PathBuf::from("/srv/site/files/form.pdf"))
        );
    }

    #[test]
    fn test_escaping_base_rejected() {
        let base = Path::new("/srv/site");
        assert_eq!(resolve_site_path(base, "../etc/passwd"), None);
        assert_eq!(resolve_site_path(base, "/files/../../secret.pdf"), None);
        assert_eq!(resolve_site_path(base, ""), None);
        assert_eq!(resolve_site_path(base, "/"), None);
    }
}
