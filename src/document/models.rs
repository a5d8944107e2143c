// src/document/models.rs
use serde::{Deserialize, Serialize};

use crate::utils::amount::is_numeric_cell;
use crate::utils::error::ExtractError;

/// A table as handed over by the PDF/OCR layer.
///
/// Deserialization goes through [`Table::from_parts`], so tables read from
/// JSON get the same cleanup as ones built from a cell grid.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "RawTable")]
pub struct Table {
    pub page_number: u32,
    pub table_index: u32,
    pub headers: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
    pub row_count: usize,
    pub column_count: usize,
}

/// Wire shape of a table. Cells may be null and the counts are recomputed.
#[derive(Deserialize)]
struct RawTable {
    #[serde(default)]
    page_number: u32,
    #[serde(default)]
    table_index: u32,
    #[serde(default)]
    headers: Option<Vec<Option<String>>>,
    #[serde(default)]
    rows: Vec<Vec<Option<String>>>,
}

impl From<RawTable> for Table {
    fn from(raw: RawTable) -> Self {
        let headers = raw.headers.map(clean_row);
        Table::from_parts(raw.page_number, raw.table_index, headers, raw.rows)
    }
}

impl Table {
    /// Builds a table from a raw cell grid.
    ///
    /// Empty rows are dropped. The first remaining row becomes the header
    /// row only when most of its non-empty cells are non-numeric.
    pub fn from_cells(page_number: u32, table_index: u32, cells: Vec<Vec<Option<String>>>) -> Self {
        Self::from_parts(page_number, table_index, None, cells)
    }

    /// Like [`Table::from_cells`], but a non-blank `headers` row is kept as
    /// given and no header is looked for in the grid.
    pub fn from_parts(
        page_number: u32,
        table_index: u32,
        headers: Option<Vec<String>>,
        cells: Vec<Vec<Option<String>>>,
    ) -> Self {
        let mut rows: Vec<Vec<String>> = cells
            .into_iter()
            .map(clean_row)
            .filter(|r| !is_blank_row(r))
            .collect();

        let headers = match headers {
            Some(h) if !is_blank_row(&h) => Some(h),
            _ if rows.len() > 1 && looks_like_header(&rows[0]) => Some(rows.remove(0)),
            _ => None,
        };

        let column_count = headers
            .iter()
            .chain(rows.iter())
            .map(|r| r.len())
            .max()
            .unwrap_or(0);

        Self {
            page_number,
            table_index,
            headers,
            row_count: rows.len(),
            column_count,
            rows,
        }
    }

    /// Checks that the table has something to scan.
    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.rows.iter().all(|r| is_blank_row(r)) {
            return Err(ExtractError::MalformedTable {
                page: self.page_number,
                index: self.table_index,
                reason: "no non-empty rows".to_string(),
            });
        }
        Ok(())
    }

    /// Rows in order with blank rows removed.
    pub fn data_rows(&self) -> impl Iterator<Item = (usize, &Vec<String>)> {
        self.rows.iter().enumerate().filter(|(_, r)| !is_blank_row(r))
    }

    /// Label position and lower-cased label of a data row, provided the row
    /// has a cell after the label to read a value from.
    pub fn labelled_row(&self, row_idx: usize, row: &[String]) -> Result<(usize, String), ExtractError> {
        let malformed = |reason: String| ExtractError::MalformedRow {
            index: self.table_index,
            row: row_idx,
            reason,
        };
        if row.len() < 2 {
            return Err(malformed(format!("{} cell(s)", row.len())));
        }
        match row_label(row) {
            Some((idx, _)) if idx + 1 >= row.len() => Err(malformed("no cells after the label".to_string())),
            Some(found) => Ok(found),
            None => Err(malformed("no label".to_string())),
        }
    }

    /// Header and row cells joined into one block of text.
    pub fn as_text(&self) -> String {
        let mut out = String::new();
        if let Some(headers) = &self.headers {
            out.push_str(&headers.join(" "));
            out.push('\n');
        }
        for (_, row) in self.data_rows() {
            out.push_str(&row.join(" "));
            out.push('\n');
        }
        out
    }
}

/// First non-empty cell of a row, trimmed and lower-cased, plus its position.
pub fn row_label(row: &[String]) -> Option<(usize, String)> {
    row.iter()
        .enumerate()
        .find(|(_, c)| !c.trim().is_empty())
        .map(|(i, c)| (i, c.trim().to_lowercase()))
}

fn clean_row(row: Vec<Option<String>>) -> Vec<String> {
    row.into_iter()
        .map(|c| c.map(|s| s.trim().to_string()).unwrap_or_default())
        .collect()
}

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

fn looks_like_header(row: &[String]) -> bool {
    let non_empty: Vec<&String> = row.iter().filter(|c| !c.trim().is_empty()).collect();
    if non_empty.is_empty() {
        return false;
    }
    let numeric = non_empty.iter().filter(|c| is_numeric_cell(c)).count();
    // Majority non-numeric.
    (numeric as f64) < non_empty.len() as f64 / 2.0
}

/// Everything the core consumes from the PDF/OCR collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentInput {
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub full_text: String,
    #[serde(default)]
    pub pages: Vec<String>,
    #[serde(default)]
    pub tables: Vec<Table>,
}

impl DocumentInput {
    pub fn new(full_text: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            full_text: full_text.into(),
            filename: filename.into(),
            ..Default::default()
        }
    }

    pub fn with_tables(mut self, tables: Vec<Table>) -> Self {
        self.tables = tables;
        self
    }

    /// Full text, or the page texts joined when no full text was supplied.
    pub fn text(&self) -> String {
        if !self.full_text.trim().is_empty() || self.pages.is_empty() {
            return self.full_text.clone();
        }
        self.pages.join("\n")
    }

    /// Tables that survive validation; malformed ones are logged and skipped.
    pub fn usable_tables(&self) -> Vec<&Table> {
        self.tables
            .iter()
            .filter(|t| match t.validate() {
                Ok(()) => true,
                Err(e) => {
                    tracing::debug!("Skipping table: {}", e);
                    false
                }
            })
            .collect()
    }
}
