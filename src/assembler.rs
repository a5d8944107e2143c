// src/assembler.rs
use serde::{Deserialize, Serialize};

use crate::classifier::{ClassificationResult, OTHER_TYPE};
use crate::extractors::extract_company_info;
use crate::schema::{
    BalanceSheet, CompanyInfo, CovidAdjustments, Expenses, ExtractionResult, IncomeStatement, OwnerInfo,
    ScheduleK, StateAdjustments,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationMetadata {
    pub document_type_internal: String,
    pub jurisdiction: String,
    pub confidence_score: f64,
    pub classification_reasons: Vec<String>,
}

/// The canonical output record. Every key is always present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionRecord {
    /// Human-readable document type, e.g. "Form 1120-S".
    pub document_type: String,
    pub entity_type: Option<String>,
    pub tax_year: Option<i32>,
    pub company_info: CompanyInfo,
    pub income_statement: IncomeStatement,
    pub expenses: Expenses,
    pub balance_sheet: BalanceSheet,
    pub schedule_k: ScheduleK,
    pub owner_info: OwnerInfo,
    pub covid_adjustments: CovidAdjustments,
    pub state_adjustments: StateAdjustments,
    pub extraction_notes: Vec<String>,
    pub red_flags: Vec<String>,
    pub classification: ClassificationMetadata,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ResultAssembler;

impl ResultAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Combines classification, extracted values and company info from
    /// `text` into one record.
    pub fn assemble(&self, classification: &ClassificationResult, extraction: ExtractionResult, text: &str) -> ExtractionRecord {
        let company_info = extract_company_info(text, classification.entity_type.as_deref());

        let mut extraction_notes = Vec::with_capacity(extraction.extraction_notes.len() + 1);
        if classification.document_type == OTHER_TYPE {
            extraction_notes.push(format!(
                "Document type not recognized (best score {:.2}); generic extraction applied",
                classification.confidence_score
            ));
        }
        extraction_notes.extend(extraction.extraction_notes);

        ExtractionRecord {
            document_type: classification.display_name.clone(),
            entity_type: classification.entity_type.clone(),
            tax_year: classification.tax_year,
            company_info,
            income_statement: extraction.income_statement,
            expenses: extraction.expenses,
            balance_sheet: extraction.balance_sheet,
            schedule_k: extraction.schedule_k,
            owner_info: extraction.owner_info,
            covid_adjustments: extraction.covid_adjustments,
            state_adjustments: extraction.state_adjustments,
            extraction_notes,
            red_flags: extraction.red_flags,
            classification: ClassificationMetadata {
                document_type_internal: classification.document_type.clone(),
                jurisdiction: classification.jurisdiction.clone(),
                confidence_score: classification.confidence_score,
                classification_reasons: classification.reasons.clone(),
            },
        }
    }
}
