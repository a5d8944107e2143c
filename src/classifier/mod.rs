// src/classifier/mod.rs
pub mod signatures;
pub mod years;

use serde::Serialize;

use crate::config::DEFAULT_MIN_CONFIDENCE;
use crate::document::Table;
use crate::utils::error::ExtractError;
pub use signatures::{signature, ExtractorKind, Signature, YearStrategy, SIGNATURES};
pub use years::extract_tax_year;

// --- Channel weights ---
const PATTERN_WEIGHT: f64 = 0.4;
const FILENAME_BONUS: f64 = 0.2;
const REQUIRED_FIELD_WEIGHT: f64 = 0.2;
const STRUCTURAL_STRONG: f64 = 0.3;
const STRUCTURAL_WEAK: f64 = 0.1;

pub const OTHER_TYPE: &str = "other";
const OTHER_DISPLAY_NAME: &str = "Other";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClassificationResult {
    /// Internal registry id, or `other`.
    pub document_type: String,
    pub display_name: String,
    pub entity_type: Option<String>,
    pub tax_year: Option<i32>,
    pub jurisdiction: String,
    pub confidence_score: f64,
    pub reasons: Vec<String>,
    #[serde(skip)]
    pub extractor: ExtractorKind,
}

/// Score of one signature against one document.
#[derive(Debug, Clone)]
pub struct SignatureScore {
    pub signature: &'static Signature,
    pub score: f64,
    pub reasons: Vec<String>,
}

/// Scores a signature. Inputs must already be lower-cased.
pub fn score_signature(sig: &'static Signature, lower_text: &str, lower_filename: &str) -> SignatureScore {
    let mut reasons = Vec::new();

    let pattern_hits = sig.patterns.iter().filter(|re| re.is_match(lower_text)).count();
    let pattern_ratio = ratio(pattern_hits, sig.patterns.len());
    if pattern_hits > 0 {
        reasons.push(format!("{}: matched {}/{} patterns", sig.id, pattern_hits, sig.patterns.len()));
    }

    let filename_bonus = match sig
        .filename_hints
        .iter()
        .find(|hint| !lower_filename.is_empty() && lower_filename.contains(*hint))
    {
        Some(hint) => {
            reasons.push(format!("{}: filename contains '{}'", sig.id, hint));
            FILENAME_BONUS
        }
        None => 0.0,
    };

    let required_hits = sig
        .required_fields
        .iter()
        .filter(|phrase| lower_text.contains(*phrase))
        .count();
    let required_ratio = ratio(required_hits, sig.required_fields.len());
    if required_hits > 0 {
        reasons.push(format!(
            "{}: found {}/{} required fields",
            sig.id,
            required_hits,
            sig.required_fields.len()
        ));
    }

    let structural = if sig.is_schema_less() {
        let found: Vec<&str> = sig
            .structural_keywords
            .iter()
            .filter(|(_, re)| re.is_match(lower_text))
            .map(|(kw, _)| *kw)
            .collect();
        if !found.is_empty() {
            reasons.push(format!("{}: structural signals [{}]", sig.id, found.join(", ")));
        }
        match found.len() {
            0 => 0.0,
            1 => STRUCTURAL_WEAK,
            _ => STRUCTURAL_STRONG,
        }
    } else {
        0.0
    };

    let raw = PATTERN_WEIGHT * pattern_ratio + filename_bonus + REQUIRED_FIELD_WEIGHT * required_ratio + structural;
    let score = raw * sig.weight;

    tracing::trace!(
        "Signature {} -> patterns {:.2}, filename {:.2}, required {:.2}, structural {:.2}, score {:.3}",
        sig.id,
        pattern_ratio,
        filename_bonus,
        required_ratio,
        structural,
        score
    );

    SignatureScore { signature: sig, score, reasons }
}

fn ratio(hits: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

/// Picks the top score. Equal scores keep the earlier registry entry.
pub fn best_match(scores: &[SignatureScore], min_confidence: f64) -> Result<&SignatureScore, ExtractError> {
    let mut best: Option<&SignatureScore> = None;
    for candidate in scores {
        match best {
            Some(current) if candidate.score <= current.score => {}
            _ => best = Some(candidate),
        }
    }

    match best {
        Some(b) if b.score >= min_confidence => Ok(b),
        Some(b) => Err(ExtractError::AmbiguousClassification { best_score: b.score }),
        None => Err(ExtractError::AmbiguousClassification { best_score: 0.0 }),
    }
}

/// Scores documents against the static signature registry.
#[derive(Debug, Clone, Copy)]
pub struct DocumentClassifier {
    min_confidence: f64,
}

impl Default for DocumentClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CONFIDENCE)
    }
}

impl DocumentClassifier {
    pub fn new(min_confidence: f64) -> Self {
        Self { min_confidence }
    }

    /// Classifies a document. Never fails: weak evidence yields `other`.
    pub fn classify(&self, text: &str, filename: &str, tables: &[&Table]) -> ClassificationResult {
        let mut lower_text = text.to_lowercase();
        for table in tables {
            lower_text.push('\n');
            lower_text.push_str(&table.as_text().to_lowercase());
        }
        let lower_filename = filename.to_lowercase();

        let scores: Vec<SignatureScore> = SIGNATURES
            .iter()
            .map(|sig| score_signature(sig, &lower_text, &lower_filename))
            .collect();

        match best_match(&scores, self.min_confidence) {
            Ok(best) => {
                let sig = best.signature;
                let confidence = best.score.clamp(0.0, 1.0);
                let mut reasons = best.reasons.clone();
                reasons.push(format!("selected {} with score {:.3}", sig.id, best.score));
                let tax_year = extract_tax_year(&lower_text, sig.year_strategy);

                tracing::info!(
                    "Classified '{}' as {} (confidence {:.2}, year {:?})",
                    filename,
                    sig.id,
                    confidence,
                    tax_year
                );

                ClassificationResult {
                    document_type: sig.id.to_string(),
                    display_name: sig.display_name.to_string(),
                    entity_type: sig.entity_type.map(str::to_string),
                    tax_year,
                    jurisdiction: sig.jurisdiction.to_string(),
                    confidence_score: confidence,
                    reasons,
                    extractor: sig.extractor,
                }
            }
            Err(err) => {
                let best_score = scores.iter().map(|s| s.score).fold(0.0, f64::max);
                tracing::info!(
                    "{} for '{}' (threshold {:.2}); classifying as other",
                    err,
                    filename,
                    self.min_confidence
                );
                ClassificationResult {
                    document_type: OTHER_TYPE.to_string(),
                    display_name: OTHER_DISPLAY_NAME.to_string(),
                    entity_type: None,
                    tax_year: extract_tax_year(&lower_text, YearStrategy::Generic),
                    jurisdiction: "none".to_string(),
                    confidence_score: best_score.clamp(0.0, 1.0),
                    reasons: vec![err.to_string()],
                    extractor: ExtractorKind::Generic,
                }
            }
        }
    }
}
