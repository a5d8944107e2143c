// src/document/loader.rs
use std::fs;
use std::path::Path;

use crate::document::models::DocumentInput;
use crate::utils::error::InputError;

/// Loads an already-extracted document from disk.
///
/// `.json` files must deserialize into `DocumentInput`; anything else is read
/// as the document's full text with no tables.
pub fn load_document(path: &Path, filename_override: Option<&str>) -> Result<DocumentInput, InputError> {
    tracing::info!("Loading document from: {}", path.display());
    let raw = fs::read_to_string(path)?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let mut doc = if is_json {
        let doc: DocumentInput = serde_json::from_str(&raw)?;
        tracing::debug!("Parsed JSON document with {} tables, {} pages", doc.tables.len(), doc.pages.len());
        doc
    } else {
        DocumentInput::new(raw, "")
    };

    if let Some(name) = filename_override {
        doc.filename = name.to_string();
    } else if doc.filename.is_empty() {
        doc.filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
    }

    if doc.text().trim().is_empty() && doc.tables.is_empty() {
        return Err(InputError::Empty(path.display().to_string()));
    }

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("tax_doc_loader_{}_{}", std::process::id(), name))
    }

    #[test]
    fn plain_text_file_becomes_full_text() {
        let path = temp_path("return.txt");
        fs::write(&path, "Form 1120-S\nGross receipts 100,000").unwrap();
        let doc = load_document(&path, None).unwrap();
        assert!(doc.full_text.contains("Gross receipts"));
        assert!(doc.filename.ends_with("return.txt"));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn json_file_keeps_tables_and_override_wins() {
        let path = temp_path("doc.json");
        let body = r#"{
            "filename": "orig.pdf",
            "full_text": "Balance Sheet",
            "tables": [{"page_number": 1, "table_index": 0, "rows": [["Cash", "1,000"]]}]
        }"#;
        fs::write(&path, body).unwrap();
        let doc = load_document(&path, Some("renamed.pdf")).unwrap();
        assert_eq!(doc.filename, "renamed.pdf");
        assert_eq!(doc.tables.len(), 1);
        assert_eq!(doc.tables[0].rows[0][1], "1,000");
        fs::remove_file(&path).ok();
    }

    #[test]
    fn json_tables_get_header_detection() {
        let path = temp_path("headers.json");
        let body = r#"{
            "full_text": "Balance Sheet",
            "tables": [{"page_number": 2, "table_index": 0,
                        "rows": [["", ""], ["Account", "Balance"], ["Cash", "1,000"], ["Inventory", "2,500"]]}]
        }"#;
        fs::write(&path, body).unwrap();
        let doc = load_document(&path, None).unwrap();
        let table = &doc.tables[0];
        assert_eq!(table.headers, Some(vec!["Account".to_string(), "Balance".to_string()]));
        assert_eq!(table.row_count, 2);
        assert_eq!(table.rows[0][0], "Cash");
        fs::remove_file(&path).ok();
    }

    #[test]
    fn empty_input_is_rejected() {
        let path = temp_path("empty.txt");
        fs::write(&path, "   \n").unwrap();
        assert!(matches!(load_document(&path, None), Err(InputError::Empty(_))));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn invalid_json_is_reported() {
        let path = temp_path("bad.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(load_document(&path, None), Err(InputError::Json(_))));
        fs::remove_file(&path).ok();
    }
}
