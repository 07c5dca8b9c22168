// =============================================================================
// C2 — Mobile number normalizer.
// =============================================================================
// Pure w.r.t. its inputs and the settings snapshot (§4.2). Splits a raw
// sender string into (country_code, local_number) via longest-prefix match
// against the configured allow-list.
// =============================================================================

const DEFAULT_COUNTRY_CODE: &str = "91";

/// Strip everything but digits.
fn clean_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Splits `raw` into (country_code, local_number). `allowed_country_codes`
/// must already be sorted longest-first (`SettingsSnapshot::allowed_country_codes`
/// guarantees this) so the first prefix match is unambiguous.
pub fn normalize(raw: &str, allowed_country_codes: &[String]) -> (String, String) {
    let digits = clean_digits(raw);

    for code in allowed_country_codes {
        if digits.starts_with(code.as_str()) {
            return (code.clone(), digits[code.len()..].to_string());
        }
    }

    if digits.len() > 10 && digits.starts_with(DEFAULT_COUNTRY_CODE) {
        return (
            DEFAULT_COUNTRY_CODE.to_string(),
            digits[DEFAULT_COUNTRY_CODE.len()..].to_string(),
        );
    }

    (DEFAULT_COUNTRY_CODE.to_string(), digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(list: &[&str]) -> Vec<String> {
        let mut v: Vec<String> = list.iter().map(|s| s.to_string()).collect();
        v.sort_by_key(|c| std::cmp::Reverse(c.len()));
        v
    }

    #[test]
    fn strips_plus_prefix_and_matches_allowed_code() {
        let (cc, local) = normalize("+919876543210", &codes(&["91"]));
        assert_eq!(cc, "91");
        assert_eq!(local, "9876543210");
    }

    #[test]
    fn strips_international_dialing_prefix() {
        let (cc, local) = normalize("00919876543210", &codes(&["91"]));
        assert_eq!(cc, "91");
        assert_eq!(local, "9876543210");
    }

    #[test]
    fn bare_local_number_falls_back_to_default_country() {
        let (cc, local) = normalize("9876543210", &codes(&["91"]));
        assert_eq!(cc, "91");
        assert_eq!(local, "9876543210");
    }

    #[test]
    fn longest_prefix_wins_when_codes_overlap() {
        // "1" and "91" both prefix "9199..."; longest-first sort must pick "91".
        let (cc, local) = normalize("+919912345678", &codes(&["1", "91"]));
        assert_eq!(cc, "91");
        assert_eq!(local, "9912345678");
    }

    #[test]
    fn sender_exactly_matching_allowed_code_yields_empty_local_number() {
        let (cc, local) = normalize("91", &codes(&["91"]));
        assert_eq!(cc, "91");
        assert_eq!(local, "");
    }

    #[test]
    fn foreign_code_not_in_allow_list_falls_back_to_default() {
        let (cc, _local) = normalize("+447712345678", &codes(&["91"]));
        // "44" is not allowed, and the digits don't start with the default
        // "91" either, so this exercises the final fallback branch.
        assert_eq!(cc, "91");
    }
}
