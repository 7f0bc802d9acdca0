//! Field parsers for calendar input: currency-formatted prices and dates.

use chrono::NaiveDate;

/// The only accepted calendar date format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const CURRENCY_SYMBOLS: &[&str] = &["R$", "$"];

/// A price field as it appears in the input, before normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawPrice<'a> {
    /// Already a plain number (`120`, `99.5`).
    Numeric(f64),
    /// Anything else that is not empty (`R$1.234,56`).
    Text(&'a str),
    Missing,
}

impl<'a> RawPrice<'a> {
    /// Classifies a raw CSV field.
    pub fn classify(field: Option<&'a str>) -> Self {
        let Some(field) = field.map(str::trim) else {
            return RawPrice::Missing;
        };
        if field.is_empty() {
            return RawPrice::Missing;
        }
        match field.parse::<f64>() {
            Ok(value) => RawPrice::Numeric(value),
            Err(_) => RawPrice::Text(field),
        }
    }

    /// Resolves the field into a canonical price, or `None` when missing.
    ///
    /// Negative and non-finite values are never valid prices. `-0.0` comes
    /// back as `0.0`.
    pub fn canonical(self) -> Option<f64> {
        let value = match self {
            RawPrice::Numeric(value) => value,
            RawPrice::Text(text) => normalize_text(text)?,
            RawPrice::Missing => return None,
        };
        (value.is_finite() && value >= 0.0).then_some(value + 0.0)
    }
}

/// Parses a price string such as `R$120.00`, `120,00` or `$1.234,56`.
///
/// Returns `None` for empty or unparseable input; never panics.
pub fn parse_price(field: &str) -> Option<f64> {
    RawPrice::classify(Some(field)).canonical()
}

/// Decides which separator is the decimal one and rewrites the number in
/// plain `1234.56` form.
///
/// | Input shape              | Decimal separator          |
/// |--------------------------|----------------------------|
/// | both `.` and `,`         | whichever occurs last      |
/// | one `,`, <= 2 digits after | `,`                      |
/// | several `,` / `,ddd`     | none (thousands)           |
/// | one `.`                  | `.`                        |
/// | several `.`              | none (thousands)           |
fn normalize_text(text: &str) -> Option<f64> {
    let mut stripped = text.trim().to_string();
    for symbol in CURRENCY_SYMBOLS {
        stripped = stripped.replace(symbol, "");
    }

    // A sign is only meaningful in front; `10 - 20` is a range, not a price.
    let unsigned = stripped.trim_start();
    let (negative, body) = match unsigned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, unsigned),
    };
    if body.contains('-') {
        return None;
    }
    let kept: String = body
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let last_dot = kept.rfind('.');
    let last_comma = kept.rfind(',');
    let commas = kept.matches(',').count();
    let dots = kept.matches('.').count();

    let plain = match (last_dot, last_comma) {
        (Some(dot), Some(comma)) if comma > dot => kept.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => kept.replace(',', ""),
        (None, Some(comma)) => {
            let trailing = kept.len() - comma - 1;
            if commas == 1 && trailing <= 2 {
                kept.replace(',', ".")
            } else {
                kept.replace(',', "")
            }
        }
        (Some(_), None) if dots > 1 => kept.replace('.', ""),
        _ => kept,
    };

    let value = plain.parse::<f64>().ok()?;
    Some(if negative { -value } else { value })
}

/// Parses a calendar date in [`DATE_FORMAT`].
pub fn parse_date(field: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(field.trim(), DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_documented_examples() {
        assert_eq!(parse_price("R$120.00"), Some(120.0));
        assert_eq!(parse_price("120,00"), Some(120.0));
        assert_eq!(parse_price("$1.234,56"), Some(1234.56));
    }

    #[test]
    fn test_empty_and_bare_symbol_are_missing() {
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("   "), None);
        assert_eq!(parse_price("R$"), None);
        assert_eq!(parse_price("$ "), None);
    }

    #[test]
    fn test_plain_numbers_pass_through() {
        assert_eq!(RawPrice::classify(Some("99.5")), RawPrice::Numeric(99.5));
        assert_eq!(parse_price("250"), Some(250.0));
        assert_eq!(parse_price("1.234"), Some(1.234));
    }

    #[test]
    fn test_comma_as_thousands_separator() {
        assert_eq!(parse_price("$1,234"), Some(1234.0));
        assert_eq!(parse_price("$1,234,567"), Some(1_234_567.0));
        assert_eq!(parse_price("$1,234.56"), Some(1234.56));
        assert_eq!(parse_price("R$ 1.234.567"), Some(1_234_567.0));
    }

    #[test]
    fn test_comma_decimal_with_one_digit() {
        assert_eq!(parse_price("R$ 99,5"), Some(99.5));
    }

    #[test]
    fn test_negative_prices_are_missing() {
        assert_eq!(parse_price("-10"), None);
        assert_eq!(parse_price("R$-120,00"), None);
        assert_eq!(parse_price("-$5.00"), None);
    }

    #[test]
    fn test_negative_zero_is_plain_zero() {
        for raw in ["$-0", "-0", "R$ -0,00"] {
            let price = parse_price(raw).unwrap();
            assert_eq!(price, 0.0);
            assert!(price.is_sign_positive(), "{raw}");
        }
    }

    #[test]
    fn test_embedded_minus_is_missing() {
        assert_eq!(parse_price("R$ 10 - 20"), None);
        assert_eq!(parse_price("100-"), None);
        assert_eq!(parse_price("1.234-56"), None);
    }

    #[test]
    fn test_garbage_is_missing() {
        assert_eq!(parse_price("abc"), None);
        assert_eq!(parse_price("N/A"), None);
        assert_eq!(parse_price("NaN"), None);
        assert_eq!(parse_price("inf"), None);
    }

    #[test]
    fn test_classify_missing() {
        assert_eq!(RawPrice::classify(None), RawPrice::Missing);
        assert_eq!(RawPrice::classify(Some("")), RawPrice::Missing);
        assert!(matches!(RawPrice::classify(Some("R$10")), RawPrice::Text("R$10")));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2025-10-01"),
            NaiveDate::from_ymd_opt(2025, 10, 1)
        );
        assert_eq!(parse_date(" 2025-11-30 "), NaiveDate::from_ymd_opt(2025, 11, 30));
        assert_eq!(parse_date("01/10/2025"), None);
        assert_eq!(parse_date("2025-02-30"), None);
        assert_eq!(parse_date(""), None);
    }
}
