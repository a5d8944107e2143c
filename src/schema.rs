// src/schema.rs
//! Canonical financial schema. Every numeric leaf defaults to 0 so the
//! serialized shape never changes with the document.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IncomeStatement {
    pub gross_receipts_sales: f64,
    pub returns_allowances: f64,
    pub cost_of_goods_sold: f64,
    pub gross_profit: f64,
    pub interest_income: f64,
    pub total_income: f64,
    pub total_deductions: f64,
    pub taxable_income: f64,
    pub net_income: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Expenses {
    pub compensation_of_officers: f64,
    pub salaries_wages: f64,
    pub repairs_maintenance: f64,
    pub bad_debts: f64,
    pub rents: f64,
    pub taxes_licenses: f64,
    pub interest: f64,
    pub depreciation: f64,
    pub depletion: f64,
    pub advertising: f64,
    pub pension_profit_sharing: f64,
    pub employee_benefits: f64,
    pub other_deductions: f64,
}

/// One column of balance-sheet values. `accumulated_depreciation` is stored
/// negative; `retained_earnings` keeps its sign.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BalanceSheetValues {
    pub cash: f64,
    pub accounts_receivable: f64,
    pub inventory: f64,
    pub other_current_assets: f64,
    pub loans_to_shareholders: f64,
    pub fixed_assets: f64,
    pub accumulated_depreciation: f64,
    pub net_fixed_assets: f64,
    pub other_assets: f64,
    pub total_assets: f64,
    pub accounts_payable: f64,
    pub loans_payable: f64,
    pub eidl_loan: f64,
    pub ppp_loan: f64,
    pub loans_from_shareholders: f64,
    pub other_liabilities: f64,
    pub total_liabilities: f64,
    pub retained_earnings: f64,
    pub total_equity: f64,
    pub total_liabilities_and_equity: f64,
}

impl BalanceSheetValues {
    /// Mutable slot for a canonical field name, if it belongs here.
    pub fn slot_mut(&mut self, field: &str) -> Option<&mut f64> {
        let slot = match field {
            "cash" => &mut self.cash,
            "accounts_receivable" => &mut self.accounts_receivable,
            "inventory" => &mut self.inventory,
            "other_current_assets" => &mut self.other_current_assets,
            "loans_to_shareholders" => &mut self.loans_to_shareholders,
            "fixed_assets" => &mut self.fixed_assets,
            "accumulated_depreciation" => &mut self.accumulated_depreciation,
            "net_fixed_assets" => &mut self.net_fixed_assets,
            "other_assets" => &mut self.other_assets,
            "total_assets" => &mut self.total_assets,
            "accounts_payable" => &mut self.accounts_payable,
            "loans_payable" => &mut self.loans_payable,
            "eidl_loan" => &mut self.eidl_loan,
            "ppp_loan" => &mut self.ppp_loan,
            "loans_from_shareholders" => &mut self.loans_from_shareholders,
            "other_liabilities" => &mut self.other_liabilities,
            "total_liabilities" => &mut self.total_liabilities,
            "retained_earnings" => &mut self.retained_earnings,
            "total_equity" => &mut self.total_equity,
            "total_liabilities_and_equity" => &mut self.total_liabilities_and_equity,
            _ => return None,
        };
        Some(slot)
    }

    /// Applies the contra-account and net fixed asset rules in place.
    pub fn normalize_fixed_assets(&mut self) {
        if self.accumulated_depreciation > 0.0 {
            self.accumulated_depreciation = -self.accumulated_depreciation;
        }
        if self.fixed_assets > 0.0 {
            self.net_fixed_assets = self.fixed_assets + self.accumulated_depreciation;
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BalanceSheet {
    #[serde(flatten)]
    pub current: BalanceSheetValues,
    pub beginning_of_year: BalanceSheetValues,
    pub end_of_year: BalanceSheetValues,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScheduleK {
    pub section_179_deduction: f64,
    pub charitable_contributions: f64,
    pub total_distributions: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OwnerInfo {
    pub owner_compensation: f64,
    pub guaranteed_payments: f64,
    pub distributions: f64,
    pub loans_to_shareholders: f64,
    pub loans_from_shareholders: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CovidAdjustments {
    pub ppp_loan_forgiveness: f64,
    pub ppp_loan_balance: f64,
    pub eidl_loan_balance: f64,
    pub employee_retention_credit: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StateAdjustments {
    pub federal_taxable_income: f64,
    pub additions: f64,
    pub subtractions: f64,
    pub state_net_income: f64,
    pub property_factor: f64,
    pub payroll_factor: f64,
    pub sales_factor: f64,
    pub apportionment_percentage: f64,
    pub apportioned_income: f64,
    pub state_tax: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompanyInfo {
    pub business_name: String,
    pub ein: Option<String>,
    pub entity_type: Option<String>,
    pub naics_code: Option<String>,
    pub business_activity: Option<String>,
    pub fiscal_year_end: String,
    pub accounting_method: String,
}

impl Default for CompanyInfo {
    fn default() -> Self {
        Self {
            business_name: "Unknown Business".to_string(),
            ein: None,
            entity_type: None,
            naics_code: None,
            business_activity: None,
            fiscal_year_end: "12/31".to_string(),
            accounting_method: "Accrual".to_string(),
        }
    }
}

/// What a specialized extractor produces for one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtractionResult {
    pub income_statement: IncomeStatement,
    pub expenses: Expenses,
    pub balance_sheet: BalanceSheet,
    pub schedule_k: ScheduleK,
    pub owner_info: OwnerInfo,
    pub covid_adjustments: CovidAdjustments,
    pub state_adjustments: StateAdjustments,
    pub company_info: CompanyInfo,
    pub extraction_notes: Vec<String>,
    pub red_flags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_fixed_assets_uses_negative_depreciation() {
        let mut values = BalanceSheetValues {
            fixed_assets: 20_000.0,
            accumulated_depreciation: 5_000.0,
            ..Default::default()
        };
        values.normalize_fixed_assets();
        assert_eq!(values.accumulated_depreciation, -5_000.0);
        assert_eq!(values.net_fixed_assets, 15_000.0);
    }

    #[test]
    fn explicit_net_kept_without_gross() {
        let mut values = BalanceSheetValues { net_fixed_assets: 9_000.0, ..Default::default() };
        values.normalize_fixed_assets();
        assert_eq!(values.net_fixed_assets, 9_000.0);
    }

    #[test]
    fn slot_lookup_covers_known_fields_only() {
        let mut values = BalanceSheetValues::default();
        *values.slot_mut("eidl_loan").unwrap() = 150_000.0;
        assert_eq!(values.eidl_loan, 150_000.0);
        assert!(values.slot_mut("rents").is_none());
    }

    #[test]
    fn balance_sheet_serializes_flat_with_year_columns() {
        let json = serde_json::to_value(BalanceSheet::default()).unwrap();
        assert_eq!(json["total_assets"], 0.0);
        assert_eq!(json["beginning_of_year"]["cash"], 0.0);
        assert_eq!(json["end_of_year"]["net_fixed_assets"], 0.0);
    }
}
