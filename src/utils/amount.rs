// src/utils/amount.rs
use crate::utils::error::ExtractError;

/// Regex fragment capturing one monetary amount in group 1.
/// Accepts `$1,234`, `1234.56`, `(5,000)`, `-5,000` and `5,000-`. The trailing
/// alternation keeps `1` in `line 1a` from being read as an amount.
pub const AMOUNT: &str = r"\$?\s*(\(?-?\$?\s*\d[\d,]*(?:\.\d+)?\)?-?)(?:[^\w.,%]|[.,](?:\s|$)|$)";

/// Regex fragment capturing a percentage or decimal fraction in group 1.
pub const PERCENT: &str = r"[:\s]*((?:\d{1,3}(?:\.\d+)?|\.\d+)\s*%?)";

/// Parses a monetary cell or captured substring.
///
/// Currency symbols, whitespace and thousands separators are stripped; a
/// parenthesized value or a leading/trailing minus is negative.
pub fn parse_amount(raw: &str) -> Result<f64, ExtractError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ExtractError::NumericParse(raw.to_string()));
    }

    let mut negative = false;
    let mut body = trimmed;

    if body.starts_with('(') && body.ends_with(')') && body.len() > 2 {
        negative = true;
        body = &body[1..body.len() - 1];
    }

    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' ' | '\t' | '\u{a0}'))
        .collect();

    let cleaned = if let Some(rest) = cleaned.strip_prefix('-') {
        negative = !negative;
        rest.to_string()
    } else if let Some(rest) = cleaned.strip_suffix('-') {
        negative = !negative;
        rest.to_string()
    } else {
        cleaned
    };

    // Only digits and a decimal point are left for a valid amount.
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(ExtractError::NumericParse(raw.to_string()));
    }

    let value: f64 = cleaned
        .parse()
        .map_err(|_| ExtractError::NumericParse(raw.to_string()))?;

    if !value.is_finite() {
        return Err(ExtractError::NumericParse(raw.to_string()));
    }

    Ok(if negative { -value } else { value })
}

/// Parses an apportionment factor. Bare fractions (`0.4550`) are scaled to
/// percentages; values above 100 are rejected.
pub fn parse_percentage(raw: &str) -> Result<f64, ExtractError> {
    let has_sign = raw.trim().ends_with('%');
    let cleaned = raw.trim().trim_end_matches('%').trim();
    let value = parse_amount(cleaned)?;
    if value < 0.0 {
        return Err(ExtractError::NumericParse(raw.to_string()));
    }
    let pct = if !has_sign && value <= 1.0 { value * 100.0 } else { value };
    if pct > 100.0 {
        return Err(ExtractError::NumericParse(raw.to_string()));
    }
    Ok(pct)
}

/// Whole-dollar rendering for notes, e.g. `$1,250,000` or `-$5,000`.
pub fn format_amount(value: f64) -> String {
    let rounded = value.abs().round() as u64;
    let digits = rounded.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0.0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

/// True when the cell reads as a number (used by header detection).
pub fn is_numeric_cell(cell: &str) -> bool {
    let cell = cell.trim().trim_end_matches('%');
    parse_amount(cell).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_and_separators_are_ignored() {
        assert_eq!(parse_amount("$1,234,567").unwrap(), parse_amount("1234567").unwrap());
        assert_eq!(parse_amount(" $ 12,500.75 ").unwrap(), 12_500.75);
    }

    #[test]
    fn parenthesized_and_minus_values_are_negative() {
        assert_eq!(parse_amount("(5,000)").unwrap(), -5000.0);
        assert_eq!(parse_amount("-5,000").unwrap(), -5000.0);
        assert_eq!(parse_amount("5,000-").unwrap(), -5000.0);
        assert_eq!(parse_amount("($250)").unwrap(), -250.0);
    }

    #[test]
    fn non_numeric_cells_fail() {
        assert!(matches!(parse_amount(""), Err(ExtractError::NumericParse(_))));
        assert!(parse_amount("Total assets").is_err());
        assert!(parse_amount("—").is_err());
        assert!(parse_amount("()").is_err());
        assert!(parse_amount("12a").is_err());
    }

    #[test]
    fn percentages_scale_fractions() {
        assert_eq!(parse_percentage("45.5%").unwrap(), 45.5);
        assert!((parse_percentage("0.2500").unwrap() - 25.0).abs() < 1e-9);
        assert_eq!(parse_percentage("100").unwrap(), 100.0);
        assert_eq!(parse_percentage("1%").unwrap(), 1.0);
        assert!(parse_percentage("250").is_err());
    }

    #[test]
    fn amounts_format_with_separators() {
        assert_eq!(format_amount(1_250_000.0), "$1,250,000");
        assert_eq!(format_amount(-5_000.0), "-$5,000");
        assert_eq!(format_amount(999.4), "$999");
    }

    #[test]
    fn numeric_cell_detection() {
        assert!(is_numeric_cell("1,000"));
        assert!(is_numeric_cell("(300)"));
        assert!(is_numeric_cell("12.5%"));
        assert!(!is_numeric_cell("Beginning of year"));
    }
}
