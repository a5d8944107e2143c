// src/extractors/generic.rs
use crate::extractors::{apply_amounts, comparative_balances, fields, ExtractionContext, FieldExtractor, FormExtractor};
use crate::schema::ExtractionResult;
use crate::utils::amount::format_amount;

/// Federal forms, P&L statements and unclassified documents: the two-strategy
/// field extraction mapped into the full schema.
pub struct GenericFormExtractor<'a> {
    ctx: ExtractionContext<'a>,
}

impl<'a> GenericFormExtractor<'a> {
    pub fn new(ctx: ExtractionContext<'a>) -> Self {
        Self { ctx }
    }

    fn note_covid_items(&mut self, result: &ExtractionResult) {
        let covid = &result.covid_adjustments;
        if covid.ppp_loan_forgiveness > 0.0 {
            self.add_note(format!(
                "PPP loan forgiveness of {} reported; non-recurring income",
                format_amount(covid.ppp_loan_forgiveness)
            ));
        }
        if covid.employee_retention_credit > 0.0 {
            self.add_note(format!(
                "Employee retention credit of {} reported; non-recurring",
                format_amount(covid.employee_retention_credit)
            ));
        }
    }
}

impl<'a> FormExtractor<'a> for GenericFormExtractor<'a> {
    fn context(&self) -> &ExtractionContext<'a> {
        &self.ctx
    }

    fn context_mut(&mut self) -> &mut ExtractionContext<'a> {
        &mut self.ctx
    }

    fn extract(&mut self) -> ExtractionResult {
        tracing::info!("Running generic form extraction");
        let mut result = ExtractionResult::default();

        let amounts = FieldExtractor::new().extract(self.ctx.lower_text(), self.ctx.tables());
        if amounts.is_empty() {
            self.add_note("No financial amounts could be extracted");
        }
        apply_amounts(&mut result, &amounts);

        // Schedule L style comparative columns.
        let (boy, eoy) = comparative_balances(self.ctx.tables(), fields::field_for_label);
        if !eoy.is_empty() {
            tracing::debug!("Comparative balance columns found");
        }
        result.balance_sheet.beginning_of_year = boy;
        result.balance_sheet.end_of_year = eoy;

        self.note_covid_items(&result);

        let loans = result
            .owner_info
            .loans_to_shareholders
            .max(result.balance_sheet.end_of_year.loans_to_shareholders);
        if loans > 0.0 {
            result.owner_info.loans_to_shareholders = loans;
            self.add_red_flag(format!("Loans to shareholders of {} reported", format_amount(loans)));
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
        GenericFormExtractor::new(ExtractionContext::new(text, tables)).extract()
    }

    #[test]
    fn maps_amounts_into_schema() {
        let text = "Form 1120-S\nGross receipts or sales 900,000\nCost of goods sold 400,000\nSalaries and wages 120,000\nDepreciation 15,000";
        let result = run(text, vec![]);
        assert_eq!(result.income_statement.gross_receipts_sales, 900_000.0);
        assert_eq!(result.income_statement.cost_of_goods_sold, 400_000.0);
        assert_eq!(result.expenses.salaries_wages, 120_000.0);
        assert_eq!(result.expenses.depreciation, 15_000.0);
        assert_eq!(result.expenses.advertising, 0.0);
        assert!(result.red_flags.is_empty());
    }

    #[test]
    fn schedule_l_columns_fill_year_balances() {
        let table = Table {
            headers: Some(vec!["Schedule L".into(), "Beginning of tax year".into(), "End of tax year".into()]),
            rows: vec![
                vec!["Cash".into(), "20,000".into(), "35,000".into()],
                vec!["Loans to shareholders".into(), "0".into(), "10,000".into()],
            ],
            ..Default::default()
        };
        let result = run("Schedule L Balance Sheets per Books", vec![&table]);
        assert_eq!(result.balance_sheet.beginning_of_year.cash, 20_000.0);
        assert_eq!(result.balance_sheet.end_of_year.cash, 35_000.0);
        assert_eq!(result.owner_info.loans_to_shareholders, 10_000.0);
        assert_eq!(result.red_flags.len(), 1);
    }

    #[test]
    fn covid_items_are_noted() {
        let text = "PPP loan forgiveness 45,000\nEmployee retention credit 26,000";
        let result = run(text, vec![]);
        assert_eq!(result.covid_adjustments.ppp_loan_forgiveness, 45_000.0);
        assert_eq!(result.covid_adjustments.employee_retention_credit, 26_000.0);
        assert_eq!(result.extraction_notes.len(), 2);
    }

    #[test]
    fn empty_document_gets_a_note() {
        let result = run("nothing to see", vec![]);
        assert_eq!(result.extraction_notes, vec!["No financial amounts could be extracted"]);
        assert_eq!(result, {
            let mut expected = ExtractionResult::default();
            expected.extraction_notes.push("No financial amounts could be extracted".into());
            expected
        });
    }
}
