// src/classifier/signatures.rs

// --- Imports ---
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::utils::patterns::{compile_all, whole_word};

// --- Prior weights ---
const FEDERAL_FORM_WEIGHT: f64 = 1.25;
const STATE_FORM_WEIGHT: f64 = 1.1;
const SCHEMA_LESS_WEIGHT: f64 = 0.8;

/// Which specialized extractor a document type is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    BalanceSheet,
    StateForm,
    Generic,
}

/// How the tax year is located for a document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearStrategy {
    Generic,
    /// "as of <date>" first, then the generic list.
    AsOfDate,
}

/// Declarative description of a document type, as written in the registry.
struct SignatureSpec {
    id: &'static str,
    display_name: &'static str,
    patterns: &'static [&'static str],
    filename_hints: &'static [&'static str],
    required_fields: &'static [&'static str],
    structural_keywords: &'static [&'static str],
    entity_type: Option<&'static str>,
    jurisdiction: &'static str,
    weight: f64,
    year_strategy: YearStrategy,
    extractor: ExtractorKind,
}

/// A compiled registry entry.
#[derive(Debug)]
pub struct Signature {
    pub id: &'static str,
    pub display_name: &'static str,
    pub patterns: Vec<Regex>,
    pub filename_hints: &'static [&'static str],
    pub required_fields: &'static [&'static str],
    /// Empty for types identified by a form title.
    pub structural_keywords: Vec<(&'static str, Regex)>,
    pub entity_type: Option<&'static str>,
    pub jurisdiction: &'static str,
    pub weight: f64,
    pub year_strategy: YearStrategy,
    pub extractor: ExtractorKind,
}

impl Signature {
    pub fn is_schema_less(&self) -> bool {
        !self.structural_keywords.is_empty()
    }
}

// Registry order is the tie-break order.
const REGISTRY: &[SignatureSpec] = &[
    SignatureSpec {
        id: "form_1120s",
        display_name: "Form 1120-S",
        patterns: &[
            r"form\s*1120[\s-]?s\b",
            r"income\s*tax\s*return\s*for\s*an\s*s\s*corporation",
            r"ordinary\s*business\s*income",
            r"compensation\s*of\s*officers",
        ],
        filename_hints: &["1120s", "1120-s", "1120_s"],
        required_fields: &["compensation of officers", "ordinary business income"],
        structural_keywords: &[],
        entity_type: Some("S-Corporation"),
        jurisdiction: "federal",
        weight: FEDERAL_FORM_WEIGHT,
        year_strategy: YearStrategy::Generic,
        extractor: ExtractorKind::Generic,
    },
    SignatureSpec {
        id: "form_1120",
        display_name: "Form 1120",
        patterns: &[
            // Not followed by "-s"/"s" so the S-Corporation return does not count.
            r"form\s*1120(?:[^\-s\d]|$)",
            r"corporation\s*income\s*tax\s*return",
            r"taxable\s*income\s*before\s*net\s*operating\s*loss",
            r"compensation\s*of\s*officers",
        ],
        filename_hints: &["1120c", "1120_c", "f1120.", "form1120."],
        required_fields: &["taxable income", "total tax"],
        structural_keywords: &[],
        entity_type: Some("C-Corporation"),
        jurisdiction: "federal",
        weight: FEDERAL_FORM_WEIGHT,
        year_strategy: YearStrategy::Generic,
        extractor: ExtractorKind::Generic,
    },
    SignatureSpec {
        id: "form_1065",
        display_name: "Form 1065",
        patterns: &[
            r"form\s*1065\b",
            r"return\s*of\s*partnership\s*income",
            r"guaranteed\s*payments",
            r"partners?'?\s*capital",
        ],
        filename_hints: &["1065"],
        required_fields: &["guaranteed payments", "partner"],
        structural_keywords: &[],
        entity_type: Some("Partnership"),
        jurisdiction: "federal",
        weight: FEDERAL_FORM_WEIGHT,
        year_strategy: YearStrategy::Generic,
        extractor: ExtractorKind::Generic,
    },
    SignatureSpec {
        id: "schedule_c",
        display_name: "Schedule C",
        patterns: &[
            r"schedule\s*c\b",
            r"profit\s*or\s*loss\s*from\s*business",
            r"sole\s*proprietorship",
            r"net\s*profit\s*or\s*\(?loss\)?",
        ],
        filename_hints: &["schedule c", "schedule-c", "schedule_c", "schedulec", "sch_c", "sch-c"],
        required_fields: &["profit or loss from business", "net profit"],
        structural_keywords: &[],
        entity_type: Some("Sole Proprietorship"),
        jurisdiction: "federal",
        weight: FEDERAL_FORM_WEIGHT,
        year_strategy: YearStrategy::Generic,
        extractor: ExtractorKind::Generic,
    },
    SignatureSpec {
        id: "ca_form_100s",
        display_name: "California Form 100S",
        patterns: &[
            r"form\s*100s\b",
            r"s\s*corporation\s*franchise\s*or\s*income\s*tax\s*return",
            r"franchise\s*tax\s*board",
            r"california",
        ],
        filename_hints: &["100s", "ca_100s", "ca-100s"],
        required_fields: &["franchise tax board", "california"],
        structural_keywords: &[],
        entity_type: Some("S-Corporation"),
        jurisdiction: "CA",
        weight: STATE_FORM_WEIGHT,
        year_strategy: YearStrategy::Generic,
        extractor: ExtractorKind::StateForm,
    },
    SignatureSpec {
        id: "ca_form_100",
        display_name: "California Form 100",
        patterns: &[
            r"form\s*100(?:[^s\d]|$)",
            r"corporation\s*franchise\s*or\s*income\s*tax\s*return",
            r"franchise\s*tax\s*board",
            r"california",
        ],
        filename_hints: &["ca_100", "ca-100", "ca100", "form100"],
        required_fields: &["franchise tax board", "california"],
        structural_keywords: &[],
        entity_type: Some("C-Corporation"),
        jurisdiction: "CA",
        weight: STATE_FORM_WEIGHT,
        year_strategy: YearStrategy::Generic,
        extractor: ExtractorKind::StateForm,
    },
    SignatureSpec {
        id: "state_corporate_return",
        display_name: "State Corporate Return",
        patterns: &[
            r"apportion(?:ment|ed)",
            r"federal\s*taxable\s*income",
            r"additions?\s*to\s*(?:federal\s*)?(?:taxable\s*)?income",
            r"subtractions?\s*from\s*(?:federal\s*)?(?:taxable\s*)?income",
            r"department\s*of\s*(?:revenue|taxation)",
        ],
        filename_hints: &["state_return", "state-return", "state return"],
        required_fields: &["federal taxable income", "apportion"],
        structural_keywords: &[],
        entity_type: None,
        jurisdiction: "state",
        weight: STATE_FORM_WEIGHT,
        year_strategy: YearStrategy::Generic,
        extractor: ExtractorKind::StateForm,
    },
    SignatureSpec {
        id: "balance_sheet",
        display_name: "Balance Sheet",
        patterns: &[
            r"balance\s*sheets?",
            r"statements?\s*of\s*financial\s*position",
            r"total\s*assets",
            r"total\s*liabilities",
        ],
        filename_hints: &["balance_sheet", "balance-sheet", "balance sheet", "balancesheet"],
        required_fields: &["assets", "liabilities"],
        structural_keywords: &["assets", "liabilities", "equity"],
        entity_type: None,
        jurisdiction: "none",
        weight: SCHEMA_LESS_WEIGHT,
        year_strategy: YearStrategy::AsOfDate,
        extractor: ExtractorKind::BalanceSheet,
    },
    SignatureSpec {
        id: "profit_and_loss",
        display_name: "Profit and Loss Statement",
        patterns: &[
            r"profit\s*(?:and|&)\s*loss",
            r"income\s*statement",
            r"statements?\s*of\s*(?:operations|income)",
            r"net\s*income",
        ],
        filename_hints: &["p&l", "p_l", "profit_and_loss", "profit-and-loss", "income_statement"],
        required_fields: &["revenue", "expenses"],
        structural_keywords: &["revenues?", "expenses", r"net\s+income"],
        entity_type: None,
        jurisdiction: "none",
        weight: SCHEMA_LESS_WEIGHT,
        year_strategy: YearStrategy::Generic,
        extractor: ExtractorKind::Generic,
    },
];

/// The signature registry, compiled once on first use and never mutated.
pub static SIGNATURES: Lazy<Vec<Signature>> = Lazy::new(|| {
    REGISTRY
        .iter()
        .map(|spec| Signature {
            id: spec.id,
            display_name: spec.display_name,
            patterns: compile_all(spec.patterns),
            filename_hints: spec.filename_hints,
            required_fields: spec.required_fields,
            structural_keywords: spec
                .structural_keywords
                .iter()
                .map(|kw| (*kw, whole_word(kw)))
                .collect(),
            entity_type: spec.entity_type,
            jurisdiction: spec.jurisdiction,
            weight: spec.weight,
            year_strategy: spec.year_strategy,
            extractor: spec.extractor,
        })
        .collect()
});

/// Looks up a registry entry by id.
pub fn signature(id: &str) -> Option<&'static Signature> {
    SIGNATURES.iter().find(|s| s.id == id)
}
