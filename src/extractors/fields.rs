// src/extractors/fields.rs

// --- Imports ---
use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::Table;
use crate::utils::amount::{parse_amount, AMOUNT};
use crate::utils::patterns::compile;

/// Canonical field name -> amount.
pub type AmountMap = BTreeMap<&'static str, f64>;

/// Ordered text patterns for one canonical field.
pub struct FieldRule {
    pub field: &'static str,
    pub patterns: Vec<Regex>,
}

// --- Text rules ---
// Each prefix is followed by the shared amount fragment. Within a field the
// list runs from most specific to most generic and the first hit wins.
const TEXT_RULES: &[(&str, &[&str])] = &[
    ("gross_receipts", &[
        r"gross\s*receipts(?:\s*or\s*sales)?.*?",
        r"total\s*(?:sales|revenues?).*?",
        r"\bline\s*1[a-c]?\b[^0-9\n]*",
    ]),
    ("returns_allowances", &[r"returns\s*(?:and|&)\s*allowances.*?"]),
    ("cogs", &[
        r"cost\s*of\s*(?:goods\s*sold|sales).*?",
        r"\bline\s*2\b[^0-9\n]*",
    ]),
    ("gross_profit", &[
        r"gross\s*profit.*?",
        r"\bline\s*3\b[^0-9\n]*",
    ]),
    ("interest_income", &[r"interest\s*income.*?"]),
    ("total_income", &[r"total\s*income.*?"]),
    ("officer_compensation", &[
        r"compensation\s*of\s*officers.*?",
        r"officers?'?\s*compensation.*?",
        r"\bline\s*7\b[^0-9\n]*",
    ]),
    ("salaries_wages", &[
        r"salaries\s*(?:and|&)?\s*wages.*?",
        r"\bline\s*8\b[^0-9\n]*",
    ]),
    ("repairs", &[r"repairs\s*(?:and|&)?\s*maintenance.*?"]),
    ("bad_debts", &[r"bad\s*debts?.*?"]),
    ("rents", &[r"\brents?\b[^a-z\n]*?"]),
    ("taxes_licenses", &[r"taxes\s*(?:and|&)\s*licenses.*?"]),
    ("interest_expense", &[r"\binterest\s*(?:expense|paid)?[^a-z\n]*?"]),
    ("depreciation", &[
        r"depreciation\s*(?:expense|deduction)[^a-z\n]*?",
        // Skips "accumulated depreciation".
        r"(?:^|[^d]\s+)depreciation[^a-z\n]*?",
        r"\bline\s*14\b[^0-9\n]*",
    ]),
    ("depletion", &[r"\bdepletion[^a-z\n]*?"]),
    ("advertising", &[r"\badvertising.*?"]),
    ("pension", &[r"pension,?\s*profit[-\s]*sharing.*?"]),
    ("employee_benefits", &[r"employee\s*benefit\s*programs?.*?"]),
    ("other_deductions", &[r"other\s*deductions.*?"]),
    ("total_deductions", &[
        r"total\s*deductions.*?",
        r"\bline\s*20\b[^0-9\n]*",
    ]),
    ("taxable_income", &[r"taxable\s*income.*?"]),
    ("net_income", &[
        r"(?:ordinary|net|taxable)\s*(?:business\s*)?income.*?",
        r"net\s*profit.*?",
        r"\bline\s*(?:21|22|30|31)\b[^0-9\n]*",
    ]),
    ("total_assets", &[r"total\s*assets.*?"]),
    ("total_liabilities_and_equity", &[
        r"total\s*liabilities\s*(?:and|&)\s*(?:(?:shareholders|stockholders|owners|members|partners)'?s?'?\s*)?(?:equity|capital).*?",
    ]),
    // Only when no words follow, so "total liabilities and equity" stays out.
    ("total_liabilities", &[r"total\s*liabilities[^a-z\n]*?"]),
    ("cash", &[r"(?:^|[^a-z])cash[^a-z\n]*?"]),
    ("accounts_receivable", &[r"(?:accounts|trade|notes)\s*receivable.*?"]),
    ("inventory", &[r"inventor(?:y|ies).*?"]),
    ("fixed_assets", &[
        r"buildings\s*and\s*other\s*depreciable\s*assets.*?",
        r"(?:property,?\s*(?:plant\s*)?(?:and|&)\s*equipment|fixed\s*assets)\b.*?",
    ]),
    ("accumulated_depreciation", &[r"accumulated\s*depreciation.*?"]),
    ("other_assets", &[r"other\s*assets.*?"]),
    ("accounts_payable", &[r"accounts\s*payable.*?"]),
    ("loans_payable", &[
        r"mortgages,?\s*notes,?\s*bonds\s*payable.*?",
        r"(?:notes|loans)\s*payable.*?",
    ]),
    ("other_liabilities", &[r"other\s*(?:current\s*)?liabilities.*?"]),
    ("retained_earnings", &[r"retained\s*earnings.*?"]),
    ("total_equity", &[
        r"total\s*(?:(?:shareholders|stockholders|owners|members|partners)'?s?'?\s*)?(?:equity|capital)\b.*?",
    ]),
    ("section_179", &[
        r"section\s*179.*?",
        r"179\s*(?:deduction|expense).*?",
    ]),
    ("charitable", &[r"charitable\s*contributions.*?"]),
    ("distributions", &[r"distributions?.*?"]),
    ("guaranteed_payments", &[r"guaranteed\s*payments.*?"]),
    ("loans_to_shareholders", &[r"loans?\s*to\s*(?:shareholders?|members?|partners?|officers?).*?"]),
    ("loans_from_shareholders", &[r"loans?\s*from\s*(?:shareholders?|members?|partners?|officers?).*?"]),
    ("ppp_forgiveness", &[
        r"ppp\s*loan\s*forgiveness.*?",
        r"forgiveness\s*of\s*(?:the\s*)?ppp\s*loans?.*?",
        r"paycheck\s*protection\s*program\s*loan\s*forgiveness.*?",
    ]),
    ("employee_retention_credit", &[r"employee\s*retention\s*(?:tax\s*)?credit.*?"]),
];

/// Compiled text rules, in declaration order.
pub static FIELD_RULES: Lazy<Vec<FieldRule>> = Lazy::new(|| {
    TEXT_RULES
        .iter()
        .map(|&(field, prefixes)| FieldRule {
            field,
            patterns: prefixes.iter().map(|p| compile(&format!("{}{}", p, AMOUNT))).collect(),
        })
        .collect()
});

// --- Table labels ---
// Lower-cased substrings of a row's first non-empty cell. Checked in order;
// the first label contained in the cell decides the field.
pub const TABLE_LABELS: &[(&str, &str)] = &[
    ("gross receipts", "gross_receipts"),
    ("total sales", "gross_receipts"),
    ("total revenue", "gross_receipts"),
    ("returns and allowances", "returns_allowances"),
    ("cost of goods", "cogs"),
    ("cost of sales", "cogs"),
    ("gross profit", "gross_profit"),
    ("interest income", "interest_income"),
    ("total income", "total_income"),
    ("officer comp", "officer_compensation"),
    ("compensation of officer", "officer_compensation"),
    ("salaries", "salaries_wages"),
    ("wages", "salaries_wages"),
    ("repairs", "repairs"),
    ("bad debt", "bad_debts"),
    ("taxes and licenses", "taxes_licenses"),
    ("accumulated depreciation", "accumulated_depreciation"),
    ("depreciation", "depreciation"),
    ("depletion", "depletion"),
    ("advertising", "advertising"),
    ("pension", "pension"),
    ("employee benefit", "employee_benefits"),
    ("other deductions", "other_deductions"),
    ("total deduction", "total_deductions"),
    ("taxable income", "taxable_income"),
    ("net income", "net_income"),
    ("ordinary income", "net_income"),
    ("ordinary business income", "net_income"),
    ("total assets", "total_assets"),
    ("total liabilities and", "total_liabilities_and_equity"),
    ("total liabilities", "total_liabilities"),
    ("loans to shareholder", "loans_to_shareholders"),
    ("loans to member", "loans_to_shareholders"),
    ("loans to partner", "loans_to_shareholders"),
    ("loans from shareholder", "loans_from_shareholders"),
    ("loans from member", "loans_from_shareholders"),
    ("loans from partner", "loans_from_shareholders"),
    ("distribution", "distributions"),
    ("cash", "cash"),
    ("receivable", "accounts_receivable"),
    ("inventor", "inventory"),
    ("buildings and other depreciable", "fixed_assets"),
    ("fixed assets", "fixed_assets"),
    ("other assets", "other_assets"),
    ("accounts payable", "accounts_payable"),
    ("mortgages", "loans_payable"),
    ("notes payable", "loans_payable"),
    ("loans payable", "loans_payable"),
    ("other liabilities", "other_liabilities"),
    ("other current liabilities", "other_liabilities"),
    ("retained earnings", "retained_earnings"),
    ("section 179", "section_179"),
    ("charitable", "charitable"),
    ("guaranteed payment", "guaranteed_payments"),
    ("rents", "rents"),
    ("rent expense", "rents"),
    ("interest", "interest_expense"),
    ("ppp loan forgiveness", "ppp_forgiveness"),
    ("ppp forgiveness", "ppp_forgiveness"),
    ("employee retention", "employee_retention_credit"),
];

/// Maps a row label to a canonical field, first matching label wins.
pub fn field_for_label(label: &str) -> Option<&'static str> {
    TABLE_LABELS
        .iter()
        .find(|(needle, _)| label.contains(needle))
        .map(|(_, field)| *field)
}

/// Value of the first capture of the first pattern that yields an amount
/// accepted by `accept`. Parse failures move on to the next pattern.
pub fn first_pattern_value<F>(patterns: &[Regex], lower_text: &str, accept: F) -> Option<f64>
where
    F: Fn(f64) -> bool,
{
    for re in patterns {
        let Some(caps) = re.captures(lower_text) else { continue };
        let Some(m) = caps.get(1) else { continue };
        match parse_amount(m.as_str()) {
            Ok(value) if accept(value) => return Some(value),
            Ok(_) => continue,
            Err(e) => {
                tracing::trace!("Pattern '{}' matched but {}", re.as_str(), e);
                continue;
            }
        }
    }
    None
}

/// Right-to-left scan of `cells` for the first non-zero number, signed.
pub fn last_nonzero_amount(cells: &[String]) -> Option<f64> {
    cells
        .iter()
        .rev()
        .filter_map(|c| parse_amount(c).ok())
        .find(|v| *v != 0.0)
}

/// Two-strategy amount extraction: pattern search over text, label matching
/// over tables, merged with text taking precedence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FieldExtractor;

impl FieldExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Runs both strategies and merges them.
    ///
    /// Text values seed the map. Table values only fill fields that are
    /// missing or zero, so a positive text value is never overridden.
    pub fn extract(&self, text: &str, tables: &[&Table]) -> AmountMap {
        let lower = text.to_lowercase();
        let mut amounts = self.extract_from_text(&lower);
        tracing::debug!("Text strategy found {} fields", amounts.len());

        for table in tables {
            let table_amounts = self.extract_from_table(table);
            merge_fill(&mut amounts, &table_amounts);
        }

        tracing::debug!("Merged amount map has {} fields", amounts.len());
        amounts
    }

    /// Strategy A. `lower_text` must already be lower-cased.
    pub fn extract_from_text(&self, lower_text: &str) -> AmountMap {
        let mut amounts = AmountMap::new();
        for rule in FIELD_RULES.iter() {
            if let Some(value) = first_pattern_value(&rule.patterns, lower_text, |v| v > 0.0) {
                tracing::trace!("Text: {} = {}", rule.field, value);
                amounts.insert(rule.field, value);
            }
        }
        amounts
    }

    /// Strategy B for a single table. Stores absolute values; a later row for
    /// the same field replaces an earlier one.
    pub fn extract_from_table(&self, table: &Table) -> AmountMap {
        let mut amounts = AmountMap::new();

        for (row_idx, row) in table.data_rows() {
            let (label_idx, label) = match table.labelled_row(row_idx, row) {
                Ok(found) => found,
                Err(e) => {
                    tracing::trace!("Skipping row: {}", e);
                    continue;
                }
            };
            let Some(field) = field_for_label(&label) else { continue };

            if let Some(value) = last_nonzero_amount(&row[label_idx + 1..]) {
                tracing::trace!("Table p{}#{}: {} = {}", table.page_number, table.table_index, field, value);
                amounts.insert(field, value.abs());
            }
        }

        amounts
    }
}

/// Fills `base` from `extra` where `base` is missing or zero.
pub fn merge_fill(base: &mut AmountMap, extra: &AmountMap) {
    for (field, value) in extra {
        if *value > 0.0 && base.get(field).copied().unwrap_or(0.0) == 0.0 {
            base.insert(*field, *value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> Table {
        Table {
            page_number: 1,
            table_index: 0,
            rows: rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn text_strategy_reads_labelled_amounts() {
        let text = "Gross receipts or sales 1a $1,250,000\nCompensation of officers 85,000\nTotal deductions 300,000";
        let amounts = FieldExtractor::new().extract(text, &[]);
        assert_eq!(amounts.get("gross_receipts"), Some(&1_250_000.0));
        assert_eq!(amounts.get("officer_compensation"), Some(&85_000.0));
        assert_eq!(amounts.get("total_deductions"), Some(&300_000.0));
    }

    #[test]
    fn falls_through_to_next_pattern_on_zero() {
        // First pattern hits a zero; the generic line pattern supplies the value.
        let text = "cost of goods sold 0\nline 2 45,000";
        let amounts = FieldExtractor::new().extract_from_text(text);
        assert_eq!(amounts.get("cogs"), Some(&45_000.0));
    }

    #[test]
    fn liabilities_and_equity_total_is_its_own_field() {
        let text = "total liabilities and shareholders' equity 500,000";
        let amounts = FieldExtractor::new().extract_from_text(text);
        assert_eq!(amounts.get("total_liabilities_and_equity"), Some(&500_000.0));
        assert_eq!(amounts.get("total_liabilities"), None);

        let amounts = FieldExtractor::new().extract_from_text("total liabilities: $180,000");
        assert_eq!(amounts.get("total_liabilities"), Some(&180_000.0));
    }

    #[test]
    fn text_value_beats_table_value() {
        let text = "Rents 24,000";
        let t = table(&[&["Rents", "30,000"]]);
        let amounts = FieldExtractor::new().extract(text, &[&t]);
        assert_eq!(amounts.get("rents"), Some(&24_000.0));
    }

    #[test]
    fn table_only_field_is_filled() {
        let t = table(&[&["Advertising", "", "7,500"], &["Bad debts", "(1,200)", ""]]);
        let amounts = FieldExtractor::new().extract("no amounts here", &[&t]);
        assert_eq!(amounts.get("advertising"), Some(&7_500.0));
        // Parenthesized table values are stored as absolute values.
        assert_eq!(amounts.get("bad_debts"), Some(&1_200.0));
    }

    #[test]
    fn right_most_nonzero_cell_wins() {
        let t = table(&[&["Cash", "10,000", "0", "12,500", "-"]]);
        let amounts = FieldExtractor::new().extract_from_table(&t);
        assert_eq!(amounts.get("cash"), Some(&12_500.0));
    }

    #[test]
    fn row_maps_to_first_matching_label_only() {
        let t = table(&[&["Accumulated depreciation", "(40,000)"], &["Cash distributions", "15,000"]]);
        let amounts = FieldExtractor::new().extract_from_table(&t);
        assert_eq!(amounts.get("accumulated_depreciation"), Some(&40_000.0));
        assert!(!amounts.contains_key("depreciation"));
        assert_eq!(amounts.get("distributions"), Some(&15_000.0));
        assert!(!amounts.contains_key("cash"));
    }

    #[test]
    fn first_table_wins_across_tables() {
        let a = table(&[&["Inventory", "5,000"]]);
        let b = table(&[&["Inventory", "9,000"]]);
        let amounts = FieldExtractor::new().extract("", &[&a, &b]);
        assert_eq!(amounts.get("inventory"), Some(&5_000.0));
    }

    #[test]
    fn single_cell_rows_are_skipped() {
        let t = table(&[&["Cash 5,000"], &["Other assets", "n/a"]]);
        let amounts = FieldExtractor::new().extract_from_table(&t);
        assert!(amounts.is_empty());
    }

    #[test]
    fn accumulated_depreciation_is_not_depreciation_text() {
        let text = "accumulated depreciation 5,000";
        let amounts = FieldExtractor::new().extract_from_text(text);
        assert_eq!(amounts.get("accumulated_depreciation"), Some(&5_000.0));
        assert!(!amounts.contains_key("depreciation"));
    }

    #[test]
    fn line_number_is_not_an_amount() {
        let text = "gross receipts or sales 1a 820,000";
        let amounts = FieldExtractor::new().extract_from_text(text);
        assert_eq!(amounts.get("gross_receipts"), Some(&820_000.0));
    }
}
