use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::LazyLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?[0-9]+(?:\.[0-9]+)?").unwrap());

/// Normalize a header or label for comparison.
///
/// Steps:
/// 1. Trim and lowercase
/// 2. Decompose (NFD) and drop combining marks, so "Distância" == "distancia"
/// 3. Collapse whitespace runs to a single space
pub fn normalize_header(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let stripped: String = lowered.nfd().filter(|c| !is_combining_mark(*c)).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract the first number from a locale-formatted string.
///
/// Commas are read as decimal separators ("102,027 km" -> "102.027"). When the
/// string holds several numbers only the leftmost one is returned.
pub fn clean_number(raw: &str) -> Option<String> {
    let s = raw.trim().replace(',', ".");
    NUMBER_RE.find(&s).map(|m| m.as_str().to_string())
}

/// `clean_number` followed by decimal conversion.
pub fn parse_number(raw: &str) -> Option<Decimal> {
    let cleaned = clean_number(raw)?;
    Decimal::from_str(&cleaned).ok()
}

/// Every number-like substring in `text`, left to right.
pub fn find_numbers(text: &str) -> Vec<Decimal> {
    let s = text.replace(',', ".");
    NUMBER_RE
        .find_iter(&s)
        .filter_map(|m| Decimal::from_str(m.as_str()).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_accents_and_case() {
        assert_eq!(normalize_header("Distância"), "distancia");
        assert_eq!(normalize_header("distancia"), "distancia");
        assert_eq!(normalize_header("  P.   Total\tdB "), "p. total db");
    }

    #[test]
    fn test_normalize_idempotent() {
        for s in ["Reflectância (dB)", "  FIM  DA FIBRA ", "", "Perda\u{00a0}Total", "İstanbul Ñ"] {
            let once = normalize_header(s);
            assert_eq!(normalize_header(&once), once);
        }
    }

    #[test]
    fn test_empty_header() {
        assert_eq!(normalize_header(""), "");
        assert_eq!(normalize_header("   "), "");
    }

    #[test]
    fn test_comma_decimal() {
        assert_eq!(clean_number("102,027 km").as_deref(), Some("102.027"));
        assert_eq!(parse_number("102,027 km"), Some(dec!(102.027)));
    }

    #[test]
    fn test_dot_decimal_with_units() {
        assert_eq!(parse_number("Perda: 3.25 dB"), Some(dec!(3.25)));
        assert_eq!(parse_number("-0,41"), Some(dec!(-0.41)));
    }

    #[test]
    fn test_leftmost_number_wins() {
        assert_eq!(clean_number("12,3 km / 15,0 km").as_deref(), Some("12.3"));
    }

    #[test]
    fn test_no_number() {
        assert_eq!(clean_number("sem valor"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_find_numbers() {
        assert_eq!(
            find_numbers("Fim 12,3 km em 2024, perda 4.1"),
            vec![dec!(12.3), dec!(2024), dec!(4.1)]
        );
    }
}
