// src/extractors/company.rs

// --- Imports ---
use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::CompanyInfo;
use crate::utils::patterns::compile;

// Patterns run case-insensitively over the text as written so names keep
// their casing.
static NAME_RE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)name\s*of\s*(?:corporation|partnership|business|company|proprietor)[:\s]+([^\n]+)",
        r"(?i)business\s*name[:\s]+([^\n]+)",
        r"(?i)(?:employer|ein)[^\n]*?([A-Z][A-Za-z\s&,\.]+(?:Inc|LLC|Corp|Co|LP|LLP)\.?)",
        r"^[^\S\n]*([A-Z][A-Za-z0-9&,\.' ]+?,?\s+(?:Inc|LLC|L\.L\.C\.|Corp|Corporation|Co|LP|LLP|Ltd)\.?)[^\S\n]*$",
    ]
    .iter()
    .map(|p| compile(p))
    .collect()
});

static EIN_RE: Lazy<Regex> =
    Lazy::new(|| compile(r"(?i)(?:\bein\b|employer\s*identification(?:\s*number)?)[:\s#]*(\d{2})[-\s]?(\d{7})\b"));

static NAICS_RE: Lazy<Regex> =
    Lazy::new(|| compile(r"(?i)(?:naics|business\s*(?:activity\s*)?code(?:\s*(?:no\.?|number))?)[:\s]*(\d{6})\b"));

static ACTIVITY_RE: Lazy<Regex> =
    Lazy::new(|| compile(r"(?i)(?:principal\s*)?business\s*activity[:\s]+([^\n]+)"));

static ACCOUNTING_METHOD_RE: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (compile(r"(?i)accounting\s*method[^\n]*?\b(?:\[x\]|☒|x)\s*accrual\b"), "Accrual"),
        (compile(r"(?i)accounting\s*method[^\n]*?\b(?:\[x\]|☒|x)\s*cash\b"), "Cash"),
        (compile(r"(?i)\baccrual\s*(?:basis|method)\b"), "Accrual"),
        (compile(r"(?i)\bcash\s*(?:basis|method)\b"), "Cash"),
        (compile(r"(?i)accounting\s*method[:\s]+accrual\b"), "Accrual"),
        (compile(r"(?i)accounting\s*method[:\s]+cash\b"), "Cash"),
    ]
});

static FISCAL_YEAR_END_RE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(?:fiscal\s*)?year\s*end(?:ed|ing)?[:\s]+(\d{1,2})/(\d{1,2})(?:/\d{2,4})?",
        r"(?i)tax\s*year\s*ending[:\s]+(\d{1,2})/(\d{1,2})(?:/\d{2,4})?",
        r"(?i)(?:fiscal\s*)?year\s*end(?:ed|ing)?[:\s]+(january|february|march|april|may|june|july|august|september|october|november|december)\s+(\d{1,2})",
    ]
    .iter()
    .map(|p| compile(p))
    .collect()
});

const MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june",
    "july", "august", "september", "october", "november", "december",
];

fn first_capture(patterns: &[Regex], text: &str, accept: impl Fn(&str) -> bool) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures_iter(text)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
            .find(|value| accept(value))
    })
}

fn business_name(text: &str) -> Option<String> {
    first_capture(&NAME_RE, text, |name| {
        let len = name.chars().count();
        len > 2 && len < 100
    })
}

fn ein(text: &str) -> Option<String> {
    EIN_RE.captures(text).map(|caps| format!("{}-{}", &caps[1], &caps[2]))
}

fn business_activity(text: &str) -> Option<String> {
    // "Business activity code" belongs to NAICS.
    first_capture(std::slice::from_ref(&*ACTIVITY_RE), text, |value| {
        !value.is_empty() && !value.to_lowercase().starts_with("code")
    })
}

fn accounting_method(text: &str) -> String {
    ACCOUNTING_METHOD_RE
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, method)| method.to_string())
        .unwrap_or_else(|| CompanyInfo::default().accounting_method)
}

fn fiscal_year_end(text: &str) -> Option<String> {
    for re in FISCAL_YEAR_END_RE.iter() {
        let Some(caps) = re.captures(text) else { continue };
        let month = match caps[1].parse::<u32>() {
            Ok(m) => m,
            Err(_) => {
                let name = caps[1].to_lowercase();
                match MONTHS.iter().position(|m| *m == name) {
                    Some(idx) => idx as u32 + 1,
                    None => continue,
                }
            }
        };
        let Ok(day) = caps[2].parse::<u32>() else { continue };
        if (1..=12).contains(&month) && (1..=31).contains(&day) {
            return Some(format!("{:02}/{:02}", month, day));
        }
    }
    None
}

/// Company identification fields. Anything not found keeps its default
/// ("Unknown Business", "12/31", "Accrual").
pub fn extract_company_info(text: &str, entity_type: Option<&str>) -> CompanyInfo {
    let defaults = CompanyInfo::default();
    let info = CompanyInfo {
        business_name: business_name(text).unwrap_or(defaults.business_name),
        ein: ein(text),
        entity_type: entity_type.map(str::to_string),
        naics_code: NAICS_RE.captures(text).map(|caps| caps[1].to_string()),
        business_activity: business_activity(text),
        fiscal_year_end: fiscal_year_end(text).unwrap_or(defaults.fiscal_year_end),
        accounting_method: accounting_method(text),
    };
    tracing::debug!("Company info: {} (EIN {:?})", info.business_name, info.ein);
    info
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_labelled_fields() {
        let text = "Name of corporation: Acme Widgets, Inc.\nEmployer identification number 12 3456789\n\
                    Business activity code no. 332710\nPrincipal business activity: Machine shop\n\
                    Accounting method: Cash\nTax year ending 06/30/2023";
        let info = extract_company_info(text, Some("S-Corporation"));
        assert_eq!(info.business_name, "Acme Widgets, Inc.");
        assert_eq!(info.ein.as_deref(), Some("12-3456789"));
        assert_eq!(info.naics_code.as_deref(), Some("332710"));
        assert_eq!(info.business_activity.as_deref(), Some("Machine shop"));
        assert_eq!(info.accounting_method, "Cash");
        assert_eq!(info.fiscal_year_end, "06/30");
        assert_eq!(info.entity_type.as_deref(), Some("S-Corporation"));
    }

    #[test]
    fn defaults_when_nothing_found() {
        let info = extract_company_info("Balance Sheet\nCash 5,000", None);
        assert_eq!(info, CompanyInfo::default());
    }

    #[test]
    fn short_names_are_rejected() {
        let info = extract_company_info("Business name: AB\nBlue Harbor Consulting LLC", None);
        assert_eq!(info.business_name, "Blue Harbor Consulting LLC");
    }

    #[test]
    fn cash_line_item_is_not_cash_method() {
        let info = extract_company_info("Cash and cash equivalents 10,000\nAccrual basis", None);
        assert_eq!(info.accounting_method, "Accrual");
        let info = extract_company_info("Prepared on the cash basis of accounting", None);
        assert_eq!(info.accounting_method, "Cash");
    }

    #[test]
    fn month_name_fiscal_year_end() {
        let info = extract_company_info("For the fiscal year ended September 30, 2023", None);
        assert_eq!(info.fiscal_year_end, "09/30");
    }
}
