// src/extractors/state_form.rs

// --- Imports ---
use once_cell::sync::Lazy;
use regex::Regex;

use crate::extractors::{apply_amounts, ExtractionContext, FieldExtractor, FormExtractor};
use crate::schema::{ExtractionResult, StateAdjustments};
use crate::utils::amount::{format_amount, parse_percentage, AMOUNT, PERCENT};
use crate::utils::patterns::compile;

// Labels only run to the amount across non-letters, so form references like
// "(form 1120, line 30)" are skipped rather than read as the amount.
const GAP: &str = r"(?:[^\S\n]*\([^)\n]*\))?[^a-z\n]*?";

fn amount_patterns(labels: &[&str]) -> Vec<Regex> {
    labels.iter().map(|l| compile(&format!("{}{}{}", l, GAP, AMOUNT))).collect()
}

fn percent_patterns(labels: &[&str]) -> Vec<Regex> {
    labels.iter().map(|l| compile(&format!(r"{}[^\d\n]*?{}", l, PERCENT))).collect()
}

static FEDERAL_INCOME_RE: Lazy<Vec<Regex>> = Lazy::new(|| {
    amount_patterns(&[
        r"federal\s*taxable\s*income",
        r"taxable\s*income\s*(?:from|per)\s*(?:the\s*)?federal\s*(?:return|form)",
        r"net\s*income\s*(?:\(loss\)\s*)?(?:from|per)\s*(?:the\s*)?federal\s*(?:return|form)",
    ])
});

static ADDITIONS_RE: Lazy<Vec<Regex>> = Lazy::new(|| {
    amount_patterns(&[
        r"total\s*(?:state\s*)?additions",
        r"state\s*additions",
        r"\badditions(?:\s*to\s*(?:federal\s*)?income)?",
    ])
});

static SUBTRACTIONS_RE: Lazy<Vec<Regex>> = Lazy::new(|| {
    amount_patterns(&[
        r"total\s*(?:state\s*)?(?:subtractions|deductions\s*from\s*federal\s*income)",
        r"state\s*subtractions",
        r"\bsubtractions(?:\s*from\s*(?:federal\s*)?income)?",
    ])
});

static STATE_NET_INCOME_RE: Lazy<Vec<Regex>> = Lazy::new(|| {
    amount_patterns(&[
        r"state\s*net\s*income",
        r"net\s*income\s*after\s*state\s*adjustments",
    ])
});

static STATE_TAX_RE: Lazy<Vec<Regex>> = Lazy::new(|| {
    amount_patterns(&[
        r"(?:total\s*)?(?:franchise|corporate\s*income|state\s*income)\s*tax(?:\s*(?:due|liability))?",
        r"\btax\s*(?:due|liability)\b",
    ])
});

static APPORTIONMENT_RE: Lazy<Vec<Regex>> = Lazy::new(|| {
    percent_patterns(&[
        r"(?:total\s*|combined\s*)?apportionment\s*(?:percentage|factor|ratio)",
        r"(?:business\s*income\s*)?apportionment\s*formula\s*percentage",
    ])
});

static PROPERTY_FACTOR_RE: Lazy<Vec<Regex>> = Lazy::new(|| percent_patterns(&[r"property\s*factor"]));
static PAYROLL_FACTOR_RE: Lazy<Vec<Regex>> = Lazy::new(|| percent_patterns(&[r"payroll\s*factor"]));
static SALES_FACTOR_RE: Lazy<Vec<Regex>> = Lazy::new(|| percent_patterns(&[r"(?:sales|receipts)\s*factor"]));

// Any apportionment language at all, numbers or not.
static APPORTION_MENTION_RE: Lazy<Regex> =
    Lazy::new(|| compile(r"apportion|(?:property|payroll|sales|receipts)\s*factor"));

// Table row labels for the baseline figures.
static FEDERAL_INCOME_LABEL: Lazy<Regex> = Lazy::new(|| compile(r"federal\s*taxable\s*income|income\s*(?:from|per)\s*federal"));
static ADDITIONS_LABEL: Lazy<Regex> = Lazy::new(|| compile(r"^(?:total\s*)?(?:state\s*)?additions"));
static SUBTRACTIONS_LABEL: Lazy<Regex> = Lazy::new(|| compile(r"^(?:total\s*)?(?:state\s*)?subtractions"));

/// State corporate returns: reconciles the federal baseline to state net
/// income and apportions it.
pub struct StateFormExtractor<'a> {
    ctx: ExtractionContext<'a>,
}

impl<'a> StateFormExtractor<'a> {
    pub fn new(ctx: ExtractionContext<'a>) -> Self {
        Self { ctx }
    }

    fn amount_or_table(&self, patterns: &[Regex], label: &Regex) -> f64 {
        let value = self.extract_amount(patterns, 0.0);
        if value != 0.0 {
            return value;
        }
        self.extract_from_table(label, None).unwrap_or(0.0)
    }

    /// First positive percentage captured by `patterns`, scaled to percent.
    fn percentage(&self, patterns: &[Regex]) -> Option<f64> {
        for re in patterns {
            for caps in re.captures_iter(self.ctx.lower_text()) {
                let Some(m) = caps.get(1) else { continue };
                match parse_percentage(m.as_str()) {
                    Ok(pct) if pct > 0.0 => return Some(pct),
                    Ok(_) => {}
                    Err(e) => tracing::debug!("Ignoring percentage '{}': {}", m.as_str(), e),
                }
            }
        }
        None
    }

    fn apportion(&mut self, adj: &mut StateAdjustments) {
        adj.property_factor = self.percentage(&PROPERTY_FACTOR_RE).unwrap_or(0.0);
        adj.payroll_factor = self.percentage(&PAYROLL_FACTOR_RE).unwrap_or(0.0);
        adj.sales_factor = self.percentage(&SALES_FACTOR_RE).unwrap_or(0.0);

        let factors: Vec<f64> = [adj.property_factor, adj.payroll_factor, adj.sales_factor]
            .into_iter()
            .filter(|f| *f > 0.0)
            .collect();

        adj.apportionment_percentage = if let Some(explicit) = self.percentage(&APPORTIONMENT_RE) {
            explicit
        } else if !factors.is_empty() {
            let average = factors.iter().sum::<f64>() / factors.len() as f64;
            self.add_note(format!(
                "Apportionment percentage averaged from {} factor(s): {:.4}%",
                factors.len(),
                average
            ));
            average
        } else if APPORTION_MENTION_RE.is_match(self.ctx.lower_text()) {
            self.add_note("Apportionment referenced but no percentage could be read; using 100%");
            100.0
        } else {
            self.add_note("No apportionment data; income treated as fully in-state (100%)");
            100.0
        };

        adj.apportioned_income = adj.state_net_income * adj.apportionment_percentage / 100.0;
    }
}

impl<'a> FormExtractor<'a> for StateFormExtractor<'a> {
    fn context(&self) -> &ExtractionContext<'a> {
        &self.ctx
    }

    fn context_mut(&mut self) -> &mut ExtractionContext<'a> {
        &mut self.ctx
    }

    fn extract(&mut self) -> ExtractionResult {
        tracing::info!("Running state form extraction");
        let mut result = ExtractionResult::default();

        let amounts = FieldExtractor::new().extract(self.ctx.lower_text(), self.ctx.tables());
        apply_amounts(&mut result, &amounts);

        let mut adj = StateAdjustments {
            federal_taxable_income: self.amount_or_table(&FEDERAL_INCOME_RE, &FEDERAL_INCOME_LABEL),
            additions: self.amount_or_table(&ADDITIONS_RE, &ADDITIONS_LABEL).abs(),
            subtractions: self.amount_or_table(&SUBTRACTIONS_RE, &SUBTRACTIONS_LABEL).abs(),
            ..Default::default()
        };

        if adj.federal_taxable_income == 0.0 {
            self.add_note("Federal taxable income baseline not found");
        } else {
            result.income_statement.taxable_income = adj.federal_taxable_income;
        }

        adj.state_net_income = adj.federal_taxable_income + adj.additions - adj.subtractions;
        if adj.state_net_income == 0.0 {
            let stated = self.extract_amount(&STATE_NET_INCOME_RE, 0.0);
            if stated != 0.0 {
                tracing::debug!("Using stated state net income {}", stated);
                adj.state_net_income = stated;
            }
        }

        self.apportion(&mut adj);

        adj.state_tax = self.extract_amount(&STATE_TAX_RE, 0.0).abs();
        if adj.state_tax == 0.0 {
            self.add_note("State tax amount not stated");
        }

        tracing::debug!(
            "State net income {} apportioned at {:.2}% -> {}",
            format_amount(adj.state_net_income),
            adj.apportionment_percentage,
            format_amount(adj.apportioned_income)
        );

        result.state_adjustments = adj;
        self.ctx.drain_into(&mut result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Table;

    fn run(text: &str, tables: Vec<&Table>) -> ExtractionResult {
        StateFormExtractor::new(ExtractionContext::new(text, tables)).extract()
    }

    #[test]
    fn reconciles_federal_to_state_income() {
        let text = "Form 100\nFederal taxable income 500,000\nState additions 20,000\nState subtractions 5,000\nFranchise tax 45,000";
        let result = run(text, vec![]);
        let adj = &result.state_adjustments;
        assert_eq!(adj.federal_taxable_income, 500_000.0);
        assert_eq!(adj.additions, 20_000.0);
        assert_eq!(adj.subtractions, 5_000.0);
        assert_eq!(adj.state_net_income, 515_000.0);
        assert_eq!(adj.state_tax, 45_000.0);
        assert_eq!(result.income_statement.taxable_income, 500_000.0);
    }

    #[test]
    fn no_apportionment_language_means_fully_in_state() {
        let result = run("Federal taxable income 100,000", vec![]);
        let adj = &result.state_adjustments;
        assert_eq!(adj.apportionment_percentage, 100.0);
        assert_eq!(adj.apportioned_income, 100_000.0);
        assert!(result.extraction_notes.iter().any(|n| n.contains("fully in-state")));
    }

    #[test]
    fn factors_are_averaged_when_no_explicit_percentage() {
        let text = "Federal taxable income 200,000\nProperty factor 40%\nPayroll factor 0.6000\nSales factor 50%";
        let adj = run(text, vec![]).state_adjustments;
        assert_eq!(adj.property_factor, 40.0);
        assert!((adj.payroll_factor - 60.0).abs() < 1e-9);
        assert_eq!(adj.sales_factor, 50.0);
        assert!((adj.apportionment_percentage - 50.0).abs() < 1e-9);
        assert!((adj.apportioned_income - 100_000.0).abs() < 1e-6);
    }

    #[test]
    fn explicit_percentage_wins_over_factors() {
        let text = "Federal taxable income 400,000\nSales factor 80%\nApportionment percentage 0.2500";
        let adj = run(text, vec![]).state_adjustments;
        assert_eq!(adj.sales_factor, 80.0);
        assert!((adj.apportionment_percentage - 25.0).abs() < 1e-9);
        assert!((adj.apportioned_income - 100_000.0).abs() < 1e-6);
    }

    #[test]
    fn form_reference_is_not_the_baseline() {
        let text = "Net income from federal return (Form 1120, line 30) 75,000";
        let adj = run(text, vec![]).state_adjustments;
        assert_eq!(adj.federal_taxable_income, 75_000.0);
    }

    #[test]
    fn baseline_falls_back_to_tables() {
        let table = Table {
            rows: vec![
                vec!["Federal taxable income".into(), "90,000".into()],
                vec!["Additions".into(), "10,000".into()],
            ],
            ..Default::default()
        };
        let result = run("California Form 100", vec![&table]);
        let adj = &result.state_adjustments;
        assert_eq!(adj.federal_taxable_income, 90_000.0);
        assert_eq!(adj.additions, 10_000.0);
        assert_eq!(adj.state_net_income, 100_000.0);
    }

    #[test]
    fn generic_fields_are_filled_too() {
        let text = "Gross receipts or sales 1,000,000\nFederal taxable income 50,000";
        let result = run(text, vec![]);
        assert_eq!(result.income_statement.gross_receipts_sales, 1_000_000.0);
    }
}
