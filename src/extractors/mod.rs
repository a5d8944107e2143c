// src/extractors/mod.rs
pub mod balance_sheet;
pub mod company;
pub mod fields;
pub mod generic;
pub mod state_form;

use regex::Regex;

use crate::classifier::ExtractorKind;
use crate::config::PipelineConfig;
use crate::document::{row_label, Table};
use crate::schema::{BalanceSheetValues, ExtractionResult};
use crate::utils::amount::parse_amount;

// Re-export key extraction types for convenience
pub use balance_sheet::BalanceSheetExtractor;
pub use company::extract_company_info;
pub use fields::{AmountMap, FieldExtractor};
pub use generic::GenericFormExtractor;
pub use state_form::StateFormExtractor;

/// Per-call state shared by the specialized extractors: the lower-cased
/// text, the usable tables, and the notes/flags accumulated so far.
#[derive(Debug, Clone)]
pub struct ExtractionContext<'a> {
    lower_text: String,
    tables: Vec<&'a Table>,
    notes: Vec<String>,
    red_flags: Vec<String>,
}

impl<'a> ExtractionContext<'a> {
    pub fn new(text: &str, tables: Vec<&'a Table>) -> Self {
        Self {
            lower_text: text.to_lowercase(),
            tables,
            notes: Vec::new(),
            red_flags: Vec::new(),
        }
    }

    pub fn lower_text(&self) -> &str {
        &self.lower_text
    }

    pub fn tables(&self) -> &[&'a Table] {
        &self.tables
    }

    /// Moves the accumulated notes and flags into `result`.
    pub fn drain_into(&mut self, result: &mut ExtractionResult) {
        result.extraction_notes.append(&mut self.notes);
        result.red_flags.append(&mut self.red_flags);
    }
}

/// Shared capability set of the document-specific extractors.
pub trait FormExtractor<'a> {
    fn context(&self) -> &ExtractionContext<'a>;
    fn context_mut(&mut self) -> &mut ExtractionContext<'a>;

    /// Builds the canonical result for this document.
    fn extract(&mut self) -> ExtractionResult;

    /// First non-zero signed amount captured by `patterns` (in order), or
    /// `default` when none matches.
    fn extract_amount(&self, patterns: &[Regex], default: f64) -> f64 {
        fields::first_pattern_value(patterns, self.context().lower_text(), |v| v != 0.0).unwrap_or(default)
    }

    /// Signed amount from the first table row whose label matches.
    ///
    /// With a `column_index` the value is read from that cell; otherwise the
    /// row is scanned right to left for the first non-zero number.
    fn extract_from_table(&self, label_pattern: &Regex, column_index: Option<usize>) -> Option<f64> {
        for table in self.context().tables() {
            for (row_idx, row) in table.data_rows() {
                let Ok((label_idx, label)) = table.labelled_row(row_idx, row) else { continue };
                if !label_pattern.is_match(&label) {
                    continue;
                }
                let value = match column_index {
                    Some(col) => row.get(col).and_then(|c| parse_amount(c).ok()),
                    None => fields::last_nonzero_amount(&row[label_idx + 1..]),
                };
                if value.is_some() {
                    return value;
                }
            }
        }
        None
    }

    fn add_note(&mut self, note: impl Into<String>)
    where
        Self: Sized,
    {
        let note = note.into();
        tracing::debug!("Note: {}", note);
        self.context_mut().notes.push(note);
    }

    fn add_red_flag(&mut self, flag: impl Into<String>)
    where
        Self: Sized,
    {
        let flag = flag.into();
        tracing::info!("Red flag: {}", flag);
        self.context_mut().red_flags.push(flag);
    }
}

/// Builds the extractor a classified document is routed to.
pub fn extractor_for<'a>(
    kind: ExtractorKind,
    text: &str,
    tables: Vec<&'a Table>,
    config: &PipelineConfig,
) -> Box<dyn FormExtractor<'a> + 'a> {
    let ctx = ExtractionContext::new(text, tables);
    match kind {
        ExtractorKind::BalanceSheet => Box::new(BalanceSheetExtractor::new(ctx, config.distribution_note_threshold)),
        ExtractorKind::StateForm => Box::new(StateFormExtractor::new(ctx)),
        ExtractorKind::Generic => Box::new(GenericFormExtractor::new(ctx)),
    }
}

/// Copies a flat amount map into the canonical schema. Unknown keys are
/// ignored and missing ones stay 0.
pub fn apply_amounts(result: &mut ExtractionResult, amounts: &AmountMap) {
    let get = |field: &str| amounts.get(field).copied().unwrap_or(0.0);

    let income = &mut result.income_statement;
    income.gross_receipts_sales = get("gross_receipts");
    income.returns_allowances = get("returns_allowances");
    income.cost_of_goods_sold = get("cogs");
    income.gross_profit = get("gross_profit");
    income.interest_income = get("interest_income");
    income.total_income = get("total_income");
    income.total_deductions = get("total_deductions");
    income.taxable_income = get("taxable_income");
    income.net_income = get("net_income");

    let ex = &mut result.expenses;
    ex.compensation_of_officers = get("officer_compensation");
    ex.salaries_wages = get("salaries_wages");
    ex.repairs_maintenance = get("repairs");
    ex.bad_debts = get("bad_debts");
    ex.rents = get("rents");
    ex.taxes_licenses = get("taxes_licenses");
    ex.interest = get("interest_expense");
    ex.depreciation = get("depreciation");
    ex.depletion = get("depletion");
    ex.advertising = get("advertising");
    ex.pension_profit_sharing = get("pension");
    ex.employee_benefits = get("employee_benefits");
    ex.other_deductions = get("other_deductions");

    let bs = &mut result.balance_sheet.current;
    for (field, value) in amounts {
        if let Some(slot) = bs.slot_mut(field) {
            *slot = *value;
        }
    }
    bs.normalize_fixed_assets();

    let k = &mut result.schedule_k;
    k.section_179_deduction = get("section_179");
    k.charitable_contributions = get("charitable");
    k.total_distributions = get("distributions");

    let owner = &mut result.owner_info;
    owner.owner_compensation = get("officer_compensation");
    owner.guaranteed_payments = get("guaranteed_payments");
    owner.distributions = get("distributions");
    owner.loans_to_shareholders = get("loans_to_shareholders");
    owner.loans_from_shareholders = get("loans_from_shareholders");

    let covid = &mut result.covid_adjustments;
    covid.ppp_loan_forgiveness = get("ppp_forgiveness");
    covid.employee_retention_credit = get("employee_retention_credit");
}

/// Reads comparative (beginning/end of year) columns from tables.
///
/// A row needs a recognised label and at least two numeric cells; the first
/// number is the beginning-of-year value and the last the end-of-year value.
/// The first row seen for a field wins.
///
/// Schedule L lays each year out as a (contra, net) column pair, so an
/// accumulated depreciation row with four numbers reads as
/// `(a) contra, (b) net, (c) contra, (d) net`.
pub fn comparative_balances<F>(tables: &[&Table], field_for: F) -> (BalanceSheetValues, BalanceSheetValues)
where
    F: Fn(&str) -> Option<&'static str>,
{
    let mut boy = BalanceSheetValues::default();
    let mut eoy = BalanceSheetValues::default();

    for table in tables {
        for (_, row) in table.data_rows() {
            let Some((label_idx, label)) = row_label(row) else { continue };
            let Some(field) = field_for(&label) else { continue };

            let numbers: Vec<f64> = row[label_idx + 1..]
                .iter()
                .filter_map(|c| parse_amount(c).ok())
                .collect();
            if numbers.len() < 2 {
                continue;
            }

            let (first, last) = if field == "accumulated_depreciation" {
                contra_columns(&numbers, &mut boy, &mut eoy)
            } else {
                (numbers[0], numbers[numbers.len() - 1])
            };
            let signed = |v: f64| if field == "retained_earnings" { v } else { v.abs() };

            fill_slot(&mut boy, field, signed(first));
            fill_slot(&mut eoy, field, signed(last));
        }
    }

    boy.normalize_fixed_assets();
    eoy.normalize_fixed_assets();
    (boy, eoy)
}

/// Picks the beginning/end contra amounts from an accumulated depreciation
/// row. Net amounts in a Schedule L layout go to `net_fixed_assets`.
fn contra_columns(numbers: &[f64], boy: &mut BalanceSheetValues, eoy: &mut BalanceSheetValues) -> (f64, f64) {
    if numbers.len() == 4 {
        fill_slot(boy, "net_fixed_assets", numbers[1].abs());
        fill_slot(eoy, "net_fixed_assets", numbers[3].abs());
        return (numbers[0], numbers[2]);
    }

    // Otherwise the contra cells are the negative ones, when they can be told apart.
    let negatives: Vec<f64> = numbers.iter().copied().filter(|v| *v < 0.0).collect();
    if negatives.len() >= 2 {
        (negatives[0], negatives[negatives.len() - 1])
    } else {
        (numbers[0], numbers[numbers.len() - 1])
    }
}

fn fill_slot(values: &mut BalanceSheetValues, field: &str, value: f64) {
    if let Some(slot) = values.slot_mut(field) {
        if *slot == 0.0 {
            *slot = value;
        }
    }
}
