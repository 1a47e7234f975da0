// Small parsing and statistics helpers shared by the loaders and the
// aggregation code.

/// Parse a CSV cell into `f64`, tolerating the usual export noise.
///
/// - Trims whitespace.
/// - Strips thousands separators (`","`), currency (`$`) and percent signs.
/// - Rejects values that still contain alphabetic characters.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s: String = s.chars().filter(|c| !matches!(c, ',' | '$' | '%')).collect();
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Trimmed label, or `None` for a blank cell.
pub fn parse_text(s: Option<&str>) -> Option<String> {
    let s = s?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formatted_numbers() {
        assert_eq!(parse_f64_safe(Some(" 1,234.5 ")), Some(1234.5));
        assert_eq!(parse_f64_safe(Some("$980")), Some(980.0));
        assert_eq!(parse_f64_safe(Some("12.5%")), Some(12.5));
    }

    #[test]
    fn rejects_blank_and_text() {
        assert_eq!(parse_f64_safe(Some("")), None);
        assert_eq!(parse_f64_safe(Some("n/a")), None);
        assert_eq!(parse_f64_safe(None), None);
    }
}
