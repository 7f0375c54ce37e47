use crate::documents::{Document, DocumentError};
use std::collections::BTreeMap;
use std::path::Path;

/// Metadata value used when a row has no `field`
pub const UNKNOWN_FIELD: &str = "unknown";

/// Loads documents from a page table
///
/// The content column is `content`, or `contents` when the former is absent.
/// The optional `field` column becomes the `field` metadata entry (default
/// `unknown`); `url` and `title` columns are kept as metadata when present.
/// Rows with empty content are skipped.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid CSV, or has no
/// content column.
pub fn load_documents(path: &Path) -> Result<Vec<Document>, DocumentError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let column = |name: &str| headers.iter().position(|h| h.trim() == name);

    let content_idx = column("content")
        .or_else(|| column("contents"))
        .ok_or_else(|| DocumentError::MissingColumn("content".to_string()))?;
    let field_idx = column("field");
    let kept: Vec<(&str, usize)> = ["url", "title"]
        .into_iter()
        .filter_map(|name| column(name).map(|idx| (name, idx)))
        .collect();

    let mut documents = Vec::new();
    let mut skipped = 0usize;

    for row in reader.records() {
        let row = row?;

        let content = row.get(content_idx).unwrap_or("").trim();
        if content.is_empty() {
            skipped += 1;
            continue;
        }

        let mut metadata = BTreeMap::new();
        let field = field_idx
            .and_then(|idx| row.get(idx))
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(UNKNOWN_FIELD);
        metadata.insert("field".to_string(), field.to_string());

        for (name, idx) in &kept {
            if let Some(value) = row.get(*idx) {
                metadata.insert(name.to_string(), value.to_string());
            }
        }

        documents.push(Document {
            content: content.to_string(),
            metadata,
        });
    }

    if skipped > 0 {
        tracing::debug!("Skipped {} row(s) without content in {}", skipped, path.display());
    }
    tracing::info!("Loaded {} document(s) from {}", documents.len(), path.display());

    Ok(documents)
}
