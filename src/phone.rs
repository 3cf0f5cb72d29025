//! Phone number normalization and validation.
//!
//! A fixed table of supported countries drives both operations. `normalize`
//! composes a canonical `+<calling code><local digits>` identifier and does
//! no validation; `is_valid` applies the country's grammar (length and
//! leading-digit rules) and returns false on malformed input rather than
//! erroring.

/// Per-country dialing grammar.
#[derive(Debug, Clone, Copy)]
pub struct CountryRule {
    /// Two-letter country identifier, e.g. "US".
    pub iso: &'static str,
    /// Display name.
    pub name: &'static str,
    /// International calling code, without the `+`.
    pub calling_code: &'static str,
    /// Permitted local-number lengths (digits after the calling code).
    lengths: &'static [usize],
    /// Permitted first local digits; empty means no constraint.
    leading: &'static [u8],
}

/// The supported-country table.
pub const SUPPORTED_COUNTRIES: &[CountryRule] = &[
    CountryRule { iso: "US", name: "United States", calling_code: "1", lengths: &[10], leading: &[2, 3, 4, 5, 6, 7, 8, 9] },
    CountryRule { iso: "CA", name: "Canada", calling_code: "1", lengths: &[10], leading: &[2, 3, 4, 5, 6, 7, 8, 9] },
    CountryRule { iso: "GB", name: "United Kingdom", calling_code: "44", lengths: &[10], leading: &[7] },
    CountryRule { iso: "AU", name: "Australia", calling_code: "61", lengths: &[9], leading: &[4] },
    CountryRule { iso: "DE", name: "Germany", calling_code: "49", lengths: &[10, 11], leading: &[1] },
    CountryRule { iso: "FR", name: "France", calling_code: "33", lengths: &[9], leading: &[6, 7] },
    CountryRule { iso: "ES", name: "Spain", calling_code: "34", lengths: &[9], leading: &[6, 7] },
    CountryRule { iso: "IN", name: "India", calling_code: "91", lengths: &[10], leading: &[6, 7, 8, 9] },
    CountryRule { iso: "BR", name: "Brazil", calling_code: "55", lengths: &[10, 11], leading: &[] },
    CountryRule { iso: "MX", name: "Mexico", calling_code: "52", lengths: &[10], leading: &[] },
    CountryRule { iso: "JP", name: "Japan", calling_code: "81", lengths: &[10], leading: &[7, 8, 9] },
];

/// Look up a country rule by its two-letter identifier (case-insensitive).
pub fn country(iso: &str) -> Option<&'static CountryRule> {
    SUPPORTED_COUNTRIES
        .iter()
        .find(|c| c.iso.eq_ignore_ascii_case(iso))
}

/// Compose the canonical phone identifier for a country and raw input.
///
/// Non-digit characters are stripped. A redundant calling-code prefix (the
/// user typed `+1 555…` with US selected) or a trunk zero (`07911…` for GB)
/// is dropped before composing. Returns `None` only for an unsupported
/// country; malformed numbers still normalize and are caught by
/// [`is_valid`].
pub fn normalize(iso: &str, raw: &str) -> Option<String> {
    let rule = country(iso)?;
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    let local = strip_prefix(rule, &digits);
    Some(format!("+{}{}", rule.calling_code, local))
}

fn strip_prefix<'a>(rule: &CountryRule, digits: &'a str) -> &'a str {
    // Already carries the calling code and the remainder is a plausible
    // local length.
    if let Some(rest) = digits.strip_prefix(rule.calling_code) {
        if rule.lengths.contains(&rest.len()) {
            return rest;
        }
    }
    // Trunk zero, used domestically outside the NANP.
    if rule.calling_code != "1" {
        if let Some(rest) = digits.strip_prefix('0') {
            return rest;
        }
    }
    digits
}

/// Validate a canonical phone identifier against a country's grammar.
pub fn is_valid(canonical: &str, iso: &str) -> bool {
    let Some(rule) = country(iso) else {
        return false;
    };
    let Some(rest) = canonical.strip_prefix('+') else {
        return false;
    };
    if !rest.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let Some(local) = rest.strip_prefix(rule.calling_code) else {
        return false;
    };
    if !rule.lengths.contains(&local.len()) {
        return false;
    }
    match local.as_bytes().first() {
        Some(b) if rule.leading.is_empty() => *b != b'0',
        Some(b) => rule.leading.contains(&(*b - b'0')),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_formatting() {
        assert_eq!(
            normalize("US", "(555) 123-4567").unwrap(),
            "+15551234567"
        );
        assert_eq!(normalize("US", "555.123.4567").unwrap(), "+15551234567");
    }

    #[test]
    fn normalize_drops_redundant_calling_code() {
        assert_eq!(normalize("US", "+15551234567").unwrap(), "+15551234567");
        assert_eq!(normalize("GB", "+447911123456").unwrap(), "+447911123456");
    }

    #[test]
    fn normalize_drops_trunk_zero() {
        assert_eq!(normalize("GB", "07911 123456").unwrap(), "+447911123456");
        assert_eq!(normalize("FR", "06 12 34 56 78").unwrap(), "+33612345678");
    }

    #[test]
    fn normalize_unsupported_country() {
        assert!(normalize("ZZ", "5551234567").is_none());
    }

    #[test]
    fn normalize_does_not_validate() {
        // Garbage input still composes; validation is is_valid's job.
        assert_eq!(normalize("US", "abc").unwrap(), "+1");
    }

    #[test]
    fn valid_numbers_accepted() {
        assert!(is_valid("+15551234567", "US"));
        assert!(is_valid("+15551234567", "CA"));
        assert!(is_valid("+447911123456", "GB"));
        assert!(is_valid("+61412345678", "AU"));
        assert!(is_valid("+919812345678", "IN"));
        assert!(is_valid("+5511987654321", "BR"));
    }

    #[test]
    fn wrong_length_rejected() {
        assert!(!is_valid("+1555123456", "US")); // 9 local digits
        assert!(!is_valid("+155512345678", "US")); // 11 local digits
        assert!(!is_valid("+1", "US")); // nothing
    }

    #[test]
    fn leading_digit_rules_applied() {
        // NANP area codes cannot start with 0 or 1.
        assert!(!is_valid("+10551234567", "US"));
        assert!(!is_valid("+11551234567", "US"));
        // GB mobiles start with 7.
        assert!(!is_valid("+441911123456", "GB"));
        // FR mobiles start with 6 or 7.
        assert!(!is_valid("+33512345678", "FR"));
    }

    #[test]
    fn non_digit_residue_rejected() {
        assert!(!is_valid("+1555123456a", "US"));
        assert!(!is_valid("15551234567", "US")); // missing +
        assert!(!is_valid("+15551234567", "ZZ")); // unknown country
    }

    #[test]
    fn normalize_then_validate_round_trip() {
        let cases = [
            ("US", "(555) 123-4567"),
            ("GB", "07911 123456"),
            ("AU", "0412 345 678"),
            ("FR", "+33 6 12 34 56 78"),
            ("IN", "98123 45678"),
        ];
        for (iso, raw) in cases {
            let canonical = normalize(iso, raw).unwrap();
            assert!(is_valid(&canonical, iso), "{iso} {raw} -> {canonical}");
        }
    }
}
