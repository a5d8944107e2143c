// src/classifier/years.rs
use once_cell::sync::Lazy;
use regex::Regex;

use crate::classifier::signatures::YearStrategy;
use crate::utils::patterns::compile_all;

pub const MIN_TAX_YEAR: i32 = 2015;
pub const MAX_TAX_YEAR: i32 = 2030;

// Ordered most specific to most generic. The last entry accepts any bare year.
static GENERIC_YEAR_RE: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"tax\s*year\s*(?:beginning|ending)?\s*(?:[a-z]+\.?\s*\d{1,2},?\s*|\d{1,2}/\d{1,2}/)?(\d{4})\b",
        r"for\s*(?:calendar\s*)?year\s*(\d{4})\b",
        r"form\s*[0-9][0-9a-z-]*\s*\((\d{4})\)",
        r"\b(\d{4})\s*(?:form|return)",
        r"(?:year|period)\s*end(?:ed|ing)?\s*(?:[a-z]+\.?\s*\d{1,2},?\s*|\d{1,2}/\d{1,2}/)(\d{4})\b",
        r"december\s*31,?\s*(\d{4})\b",
        r"\b(\d{4})\s*u\.?s\.?\s*(?:income\s*)?tax",
        r"\b(20[1-3]\d)\b",
    ])
});

static AS_OF_YEAR_RE: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"as\s*of\s*(?:[a-z]+\.?\s*\d{1,2},?\s*|\d{1,2}[/-]\d{1,2}[/-])(\d{4})\b",
        r"as\s*of\s*(?:the\s*)?(?:fiscal\s*)?(?:year|period)\s*end(?:ed|ing)?\s*(?:[a-z]+\.?\s*\d{1,2},?\s*)?(\d{4})\b",
    ])
});

/// Finds the tax year in lower-cased text.
///
/// Patterns are tried in order; for each pattern every match is checked and
/// the first captured year inside [2015, 2030] wins.
pub fn extract_tax_year(lower_text: &str, strategy: YearStrategy) -> Option<i32> {
    if strategy == YearStrategy::AsOfDate {
        if let Some(year) = first_year_in_range(&AS_OF_YEAR_RE, lower_text) {
            tracing::debug!("Tax year {} from 'as of' date", year);
            return Some(year);
        }
    }
    first_year_in_range(&GENERIC_YEAR_RE, lower_text)
}

fn first_year_in_range(patterns: &[Regex], text: &str) -> Option<i32> {
    for (idx, re) in patterns.iter().enumerate() {
        for caps in re.captures_iter(text) {
            let Some(m) = caps.get(1) else { continue };
            match m.as_str().parse::<i32>() {
                Ok(year) if (MIN_TAX_YEAR..=MAX_TAX_YEAR).contains(&year) => {
                    tracing::trace!("Year pattern #{} matched {}", idx, year);
                    return Some(year);
                }
                _ => continue,
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_header_year() {
        let text = "form 1120-s (2023) u.s. income tax return for an s corporation";
        assert_eq!(extract_tax_year(text, YearStrategy::Generic), Some(2023));
    }

    #[test]
    fn out_of_range_years_are_skipped() {
        let text = "for calendar year 1999 ... tax year ending december 31, 2022";
        assert_eq!(extract_tax_year(text, YearStrategy::Generic), Some(2022));
    }

    #[test]
    fn as_of_date_preferred_for_statements() {
        let text = "printed 2025\nbalance sheet\nas of december 31, 2021";
        assert_eq!(extract_tax_year(text, YearStrategy::AsOfDate), Some(2021));
        assert_eq!(extract_tax_year("as of 12/31/2020", YearStrategy::AsOfDate), Some(2020));
    }

    #[test]
    fn bare_year_is_last_resort() {
        assert_eq!(extract_tax_year("notes from 2019 meeting", YearStrategy::Generic), Some(2019));
        assert_eq!(extract_tax_year("nothing to see here", YearStrategy::Generic), None);
        assert_eq!(extract_tax_year("invoice 4812 total 12", YearStrategy::Generic), None);
    }
}
