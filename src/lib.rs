// src/lib.rs
//! Tax return and financial statement extraction: classifies a parsed
//! document, pulls financial fields out of its text and tables, and
//! assembles one canonical record.

pub mod assembler;
pub mod classifier;
pub mod config;
pub mod document;
pub mod extractors;
pub mod schema;
pub mod storage;
pub mod utils;

pub use assembler::{ExtractionRecord, ResultAssembler};
pub use classifier::{ClassificationResult, DocumentClassifier};
pub use config::PipelineConfig;
pub use document::{DocumentInput, Table};

/// Runs the pipeline with default settings.
pub fn process_document(input: &DocumentInput) -> ExtractionRecord {
    process_document_with_config(input, &PipelineConfig::default())
}

/// Classify, extract, assemble. Never fails: malformed tables are skipped and
/// weak evidence degrades to an `other` classification with zeroed fields.
pub fn process_document_with_config(input: &DocumentInput, config: &PipelineConfig) -> ExtractionRecord {
    let text = input.text();
    let tables = input.usable_tables();
    tracing::debug!(
        "Processing '{}' ({} chars, {} usable tables)",
        input.filename,
        text.len(),
        tables.len()
    );

    let classification = DocumentClassifier::new(config.min_confidence).classify(&text, &input.filename, &tables);

    let mut extractor = extractors::extractor_for(classification.extractor, &text, tables, config);
    let extraction = extractor.extract();

    let record = ResultAssembler::new().assemble(&classification, extraction, &text);
    tracing::info!(
        "Extracted '{}' as {} with {} note(s) and {} red flag(s)",
        input.filename,
        record.document_type,
        record.extraction_notes.len(),
        record.red_flags.len()
    );
    record
}
