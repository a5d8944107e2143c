// src/extractors/balance_sheet.rs

// --- Imports ---
use once_cell::sync::Lazy;
use regex::Regex;

use crate::extractors::{comparative_balances, ExtractionContext, FormExtractor};
use crate::schema::{BalanceSheetValues, ExtractionResult};
use crate::utils::amount::{format_amount, AMOUNT};
use crate::utils::patterns::compile;

// Dot leaders, colons and spaces between a label and its amount.
const LEADER: &str = r"(?:[^\S\n]|\.|:|_)*";

// A label starts a line or follows the previous item's amount on the same
// line (statements flattened onto one line, or two columns side by side).
const LABEL_START: &str = r"(?:^[^\S\n]*|\d[\d,.]*\)?-?[^\S\n]+)";

/// One balance-sheet line item: the same label drives a line pattern for
/// free text and an anchored pattern for table row labels.
pub struct LineItem {
    pub field: &'static str,
    pub text_patterns: Vec<Regex>,
    pub table_patterns: Vec<Regex>,
}

// Label fragments per field, most specific first. Matching is purely by label;
// section position and indentation are ignored.
const LINE_ITEMS: &[(&str, &[&str])] = &[
    // --- Assets ---
    ("cash", &[
        r"cash(?:\s*(?:and|&)\s*(?:cash\s*)?equivalents)?",
        r"(?:total\s*)?(?:checking|savings|bank)\s*accounts?",
    ]),
    ("accounts_receivable", &[
        r"(?:trade\s*)?(?:notes\s*and\s*)?accounts\s*receivable(?:,?\s*net)?",
        r"receivables?",
    ]),
    ("inventory", &[r"inventor(?:y|ies)"]),
    ("other_current_assets", &[
        r"(?:total\s*)?other\s*current\s*assets",
        r"prepaid\s*expenses",
    ]),
    ("loans_to_shareholders", &[
        r"loans?\s*to\s*(?:shareholders?|stockholders?|members?|partners?|officers?|owners?)",
        r"(?:shareholder|stockholder|officer|owner)\s*(?:loans?\s*)?receivable",
    ]),
    ("fixed_assets", &[
        r"(?:total\s*)?(?:gross\s*)?fixed\s*assets(?:,?\s*(?:gross|at\s*cost))?",
        r"(?:total\s*)?property(?:,)?\s*(?:plant\s*)?(?:and|&)\s*equipment(?:,?\s*at\s*cost)?",
        r"buildings\s*and\s*other\s*depreciable\s*assets",
        r"furniture\s*(?:and|&)\s*(?:fixtures|equipment)",
    ]),
    ("accumulated_depreciation", &[
        r"accumulated\s*depreciation(?:\s*(?:and|&)\s*amortization)?",
        r"allowance\s*for\s*depreciation",
    ]),
    ("net_fixed_assets", &[
        r"net\s*fixed\s*assets",
        r"(?:total\s*)?fixed\s*assets,?\s*net",
        r"(?:net\s*property|property(?:,)?\s*(?:plant\s*)?(?:and|&)\s*equipment,?\s*net)",
    ]),
    ("other_assets", &[r"(?:total\s*)?other\s*assets"]),
    ("total_assets", &[r"total\s*assets"]),
    // --- Liabilities ---
    ("accounts_payable", &[r"accounts\s*payable", r"trade\s*payables?"]),
    ("eidl_loan", &[
        r"(?:sba\s*)?eidl(?:\s*loan)?(?:\s*payable)?",
        r"economic\s*injury\s*disaster\s*loan(?:\s*payable)?",
    ]),
    ("ppp_loan", &[
        r"(?:sba\s*)?ppp\s*loan(?:\s*payable)?",
        r"paycheck\s*protection\s*program\s*loan(?:\s*payable)?",
    ]),
    ("loans_payable", &[
        r"(?:notes|loans?)\s*payable",
        r"mortgages?\s*payable",
        r"long[-\s]*term\s*debt",
        r"line\s*of\s*credit",
    ]),
    ("loans_from_shareholders", &[
        r"loans?\s*from\s*(?:shareholders?|stockholders?|members?|partners?|officers?|owners?)",
        r"(?:shareholder|stockholder|officer|owner)\s*loans?(?:\s*payable)?",
        r"due\s*to\s*(?:shareholders?|officers?|owners?)",
    ]),
    ("other_liabilities", &[
        r"(?:total\s*)?other\s*(?:current\s*)?liabilities",
        r"accrued\s*(?:expenses|liabilities)",
    ]),
    ("total_liabilities", &[r"total\s*liabilities"]),
    ("total_liabilities_and_equity", &[
        r"total\s*liabilities\s*(?:and|&)\s*(?:(?:shareholders|stockholders|owners|members|partners)'?s?'?\s*)?(?:equity|capital)",
    ]),
    // --- Equity ---
    ("retained_earnings", &[r"retained\s*earnings"]),
    ("accumulated_deficit", &[r"(?:accumulated|retained)\s*deficit"]),
    ("distributions", &[
        r"(?:shareholder|stockholder|owner|member|partner)?s?'?\s*distributions?",
        r"owners?'?\s*draws?",
    ]),
    ("total_equity", &[
        r"total\s*(?:(?:shareholders|stockholders|owners|members|partners)'?s?'?\s*)?(?:equity|capital)",
    ]),
];

/// Compiled line items, in declaration order.
pub static BALANCE_ITEMS: Lazy<Vec<LineItem>> = Lazy::new(|| {
    LINE_ITEMS
        .iter()
        .map(|&(field, labels)| LineItem {
            field,
            text_patterns: labels
                .iter()
                .map(|label| {
                    compile(&format!(
                        r"{}(?:less:?[^\S\n]*)?(?:{})(?:[^\S\n]*\([a-z\s]+\))?{}{}",
                        LABEL_START, label, LEADER, AMOUNT
                    ))
                })
                .collect(),
            table_patterns: labels
                .iter()
                .map(|label| {
                    compile(&format!(
                        r"^(?:less:?\s*)?(?:{})(?:\s*\([a-z\s]+\))?\s*:?$",
                        label
                    ))
                })
                .collect(),
        })
        .collect()
});

static EIDL_MENTION_RE: Lazy<Regex> = Lazy::new(|| compile(r"\beidl\b|economic\s*injury\s*disaster"));
static PPP_MENTION_RE: Lazy<Regex> = Lazy::new(|| compile(r"\bppp\b|paycheck\s*protection"));

/// Balance sheet for a table row label, used for comparative columns.
fn balance_field_for_label(label: &str) -> Option<&'static str> {
    BALANCE_ITEMS
        .iter()
        .find(|item| item.table_patterns.iter().any(|re| re.is_match(label)))
        .map(|item| item.field)
        .filter(|field| *field != "accumulated_deficit")
}

/// Stand-alone balance sheets (no form schema). Parses assets, liabilities
/// and equity line items and applies the hierarchy rules.
pub struct BalanceSheetExtractor<'a> {
    ctx: ExtractionContext<'a>,
    distribution_note_threshold: f64,
}

impl<'a> BalanceSheetExtractor<'a> {
    pub fn new(ctx: ExtractionContext<'a>, distribution_note_threshold: f64) -> Self {
        Self { ctx, distribution_note_threshold }
    }

    /// Text first, then table rows; 0 when neither has the item.
    fn resolve(&self, item: &LineItem) -> f64 {
        let from_text = self.extract_amount(&item.text_patterns, 0.0);
        if from_text != 0.0 {
            return from_text;
        }
        item.table_patterns
            .iter()
            .find_map(|re| self.extract_from_table(re, None))
            .unwrap_or(0.0)
    }

    fn read_values(&self) -> (BalanceSheetValues, f64, f64) {
        let mut values = BalanceSheetValues::default();
        let mut deficit = 0.0;
        let mut distributions = 0.0;

        for item in BALANCE_ITEMS.iter() {
            let value = self.resolve(item);
            if value == 0.0 {
                continue;
            }
            tracing::trace!("Balance sheet: {} = {}", item.field, value);
            match item.field {
                "accumulated_deficit" => deficit = value,
                "distributions" => distributions = value.abs(),
                // Signed contra-accounts keep what the document says.
                "retained_earnings" | "accumulated_depreciation" => {
                    if let Some(slot) = values.slot_mut(item.field) {
                        *slot = value;
                    }
                }
                field => {
                    if let Some(slot) = values.slot_mut(field) {
                        *slot = value.abs();
                    }
                }
            }
        }

        if values.retained_earnings == 0.0 && deficit != 0.0 {
            values.retained_earnings = -deficit.abs();
        }

        (values, deficit, distributions)
    }

    fn check_totals(&mut self, values: &BalanceSheetValues) {
        if values.total_assets <= 0.0 || (values.total_liabilities == 0.0 && values.total_equity == 0.0) {
            return;
        }
        let rhs = values.total_liabilities + values.total_equity;
        if (values.total_assets - rhs).abs() > 1.0 {
            self.add_note(format!(
                "Total assets {} do not equal liabilities plus equity {}",
                format_amount(values.total_assets),
                format_amount(rhs)
            ));
        }
    }

    fn flag_owner_items(&mut self, values: &BalanceSheetValues, distributions: f64) {
        if values.loans_to_shareholders > 0.0 {
            self.add_red_flag(format!(
                "Loans to shareholders of {} on the balance sheet",
                format_amount(values.loans_to_shareholders)
            ));
        }
        if values.retained_earnings < 0.0 {
            self.add_red_flag(format!(
                "Negative retained earnings of {}",
                format_amount(values.retained_earnings)
            ));
        }
        if distributions > self.distribution_note_threshold {
            self.add_note(format!(
                "Shareholder distributions of {} exceed {}",
                format_amount(distributions),
                format_amount(self.distribution_note_threshold)
            ));
        }
    }

    fn flag_covid_items(&mut self, values: &BalanceSheetValues) {
        if values.eidl_loan > 0.0 {
            self.add_note(format!(
                "EIDL loan balance of {} detected; treat as COVID-era debt in valuation adjustments",
                format_amount(values.eidl_loan)
            ));
        } else if EIDL_MENTION_RE.is_match(self.ctx.lower_text()) {
            self.add_note("EIDL loan referenced but no balance could be read");
        }

        if values.ppp_loan > 0.0 {
            self.add_note(format!(
                "PPP loan balance of {} detected; check forgiveness status",
                format_amount(values.ppp_loan)
            ));
        } else if PPP_MENTION_RE.is_match(self.ctx.lower_text()) {
            self.add_note("PPP loan referenced but no balance could be read");
        }
    }
}

impl<'a> FormExtractor<'a> for BalanceSheetExtractor<'a> {
    fn context(&self) -> &ExtractionContext<'a> {
        &self.ctx
    }

    fn context_mut(&mut self) -> &mut ExtractionContext<'a> {
        &mut self.ctx
    }

    fn extract(&mut self) -> ExtractionResult {
        tracing::info!("Running balance sheet extraction");
        let (mut values, deficit, distributions) = self.read_values();

        if values.accumulated_depreciation > 0.0 {
            tracing::debug!("Accumulated depreciation parsed positive; storing as contra-asset");
        }
        values.normalize_fixed_assets();
        if deficit != 0.0 && values.retained_earnings < 0.0 {
            self.add_note("Accumulated deficit read as negative retained earnings");
        }

        self.check_totals(&values);
        self.flag_owner_items(&values, distributions);
        self.flag_covid_items(&values);

        let (boy, eoy) = comparative_balances(self.ctx.tables(), balance_field_for_label);

        let mut result = ExtractionResult::default();
        result.owner_info.loans_to_shareholders = values.loans_to_shareholders;
        result.owner_info.loans_from_shareholders = values.loans_from_shareholders;
        result.owner_info.distributions = distributions;
        result.schedule_k.total_distributions = distributions;
        result.covid_adjustments.eidl_loan_balance = values.eidl_loan;
        result.covid_adjustments.ppp_loan_balance = values.ppp_loan;
        result.balance_sheet.current = values;
        result.balance_sheet.beginning_of_year = boy;
        result.balance_sheet.end_of_year = eoy;

        if result.balance_sheet.current.is_empty() {
            self.add_note("No balance sheet line items recognized");
        }

        self.ctx.drain_into(&mut result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Table;

    fn run(text: &str, tables: Vec<&Table>) -> ExtractionResult {
        BalanceSheetExtractor::new(ExtractionContext::new(text, tables), 100_000.0).extract()
    }

    #[test]
    fn net_fixed_assets_from_gross_and_depreciation() {
        let text = "Balance Sheet\nAssets\nFixed Assets 20,000\nAccumulated Depreciation 5,000\nTotal Assets 15,000";
        let result = run(text, vec![]);
        let bs = &result.balance_sheet.current;
        assert_eq!(bs.fixed_assets, 20_000.0);
        assert_eq!(bs.accumulated_depreciation, -5_000.0);
        assert_eq!(bs.net_fixed_assets, 15_000.0);
    }

    #[test]
    fn items_flattened_onto_one_line() {
        let text = "Fixed Assets 20,000   Accumulated Depreciation 5,000   Total Assets 15,000";
        let bs = run(text, vec![]).balance_sheet.current;
        assert_eq!(bs.fixed_assets, 20_000.0);
        assert_eq!(bs.accumulated_depreciation, -5_000.0);
        assert_eq!(bs.net_fixed_assets, 15_000.0);
        assert_eq!(bs.total_assets, 15_000.0);
    }

    #[test]
    fn two_column_statement() {
        let text = "Assets                 Liabilities\n\
                    Cash 10,000            Accounts payable 4,000\n\
                    Inventory 6,000        Notes payable (2,500)\n\
                    Total assets 16,000    Total liabilities 6,500";
        let bs = run(text, vec![]).balance_sheet.current;
        assert_eq!(bs.cash, 10_000.0);
        assert_eq!(bs.accounts_payable, 4_000.0);
        assert_eq!(bs.inventory, 6_000.0);
        assert_eq!(bs.loans_payable, 2_500.0);
        assert_eq!(bs.total_assets, 16_000.0);
        assert_eq!(bs.total_liabilities, 6_500.0);
    }

    #[test]
    fn label_inside_a_sentence_is_ignored() {
        let text = "The company repaid its accounts payable 4,000 days late";
        let bs = run(text, vec![]).balance_sheet.current;
        assert_eq!(bs.accounts_payable, 0.0);
    }

    #[test]
    fn parenthesized_depreciation_stays_negative() {
        let text = "Property and equipment 50,000\nLess: accumulated depreciation (12,000)";
        let bs = run(text, vec![]).balance_sheet.current;
        assert_eq!(bs.accumulated_depreciation, -12_000.0);
        assert_eq!(bs.net_fixed_assets, 38_000.0);
    }

    #[test]
    fn shareholder_loans_and_deficit_raise_red_flags() {
        let text = "Loans to shareholders 25,000\nRetained earnings (40,000)";
        let result = run(text, vec![]);
        assert_eq!(result.balance_sheet.current.retained_earnings, -40_000.0);
        assert_eq!(result.owner_info.loans_to_shareholders, 25_000.0);
        assert_eq!(result.red_flags.len(), 2);
        assert!(result.red_flags[0].contains("Loans to shareholders"));
        assert!(result.red_flags[1].contains("-$40,000"));
    }

    #[test]
    fn accumulated_deficit_is_negative_retained_earnings() {
        let result = run("Accumulated deficit 7,500", vec![]);
        assert_eq!(result.balance_sheet.current.retained_earnings, -7_500.0);
        assert!(result.red_flags.iter().any(|f| f.contains("Negative retained earnings")));
    }

    #[test]
    fn covid_loans_are_noted() {
        let text = "Liabilities\nSBA EIDL Loan 149,900\nPPP Loan Payable 20,000";
        let result = run(text, vec![]);
        assert_eq!(result.covid_adjustments.eidl_loan_balance, 149_900.0);
        assert_eq!(result.covid_adjustments.ppp_loan_balance, 20_000.0);
        assert!(result.extraction_notes.iter().any(|n| n.starts_with("EIDL loan balance of $149,900")));
        assert!(result.extraction_notes.iter().any(|n| n.starts_with("PPP loan balance")));
        assert_eq!(result.balance_sheet.current.loans_payable, 0.0);
    }

    #[test]
    fn large_distributions_get_a_note() {
        let result = run("Shareholder distributions 150,000", vec![]);
        assert_eq!(result.owner_info.distributions, 150_000.0);
        assert!(result.extraction_notes.iter().any(|n| n.contains("exceed $100,000")));
        assert!(result.red_flags.is_empty());
    }

    #[test]
    fn table_rows_fill_missing_items() {
        let table = Table {
            rows: vec![
                vec!["Cash".into(), "12,000".into()],
                vec!["Accounts payable".into(), "3,000".into()],
                vec!["Total liabilities and equity".into(), "12,000".into()],
            ],
            ..Default::default()
        };
        let result = run("Balance Sheet", vec![&table]);
        let bs = &result.balance_sheet.current;
        assert_eq!(bs.cash, 12_000.0);
        assert_eq!(bs.accounts_payable, 3_000.0);
        assert_eq!(bs.total_liabilities_and_equity, 12_000.0);
        assert_eq!(bs.total_liabilities, 0.0);
    }

    #[test]
    fn comparative_table_fills_year_columns() {
        let table = Table {
            headers: Some(vec!["".into(), "2022".into(), "2023".into()]),
            rows: vec![
                vec!["Cash".into(), "8,000".into(), "12,000".into()],
                vec!["Retained earnings".into(), "(2,000)".into(), "4,000".into()],
            ],
            ..Default::default()
        };
        let result = run("", vec![&table]);
        assert_eq!(result.balance_sheet.beginning_of_year.cash, 8_000.0);
        assert_eq!(result.balance_sheet.end_of_year.cash, 12_000.0);
        assert_eq!(result.balance_sheet.beginning_of_year.retained_earnings, -2_000.0);
    }

    #[test]
    fn mismatched_totals_are_noted() {
        let text = "Total assets 100,000\nTotal liabilities 40,000\nTotal equity 50,000";
        let result = run(text, vec![]);
        assert!(result.extraction_notes.iter().any(|n| n.contains("do not equal")));
    }
}
