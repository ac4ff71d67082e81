/// Normalizes a phone number to the gateway's international form.
///
/// Non-digits are dropped, a trunk `0` is replaced by the country prefix, and
/// numbers already starting with the prefix are kept. Anything else gets the
/// prefix prepended.
pub fn normalize_phone_number(raw: &str, country_prefix: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    if let Some(rest) = digits.strip_prefix('0') {
        format!("{}{}", country_prefix, rest)
    } else if digits.starts_with(country_prefix) {
        digits
    } else {
        format!("{}{}", country_prefix, digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trunk_zero_becomes_country_prefix() {
        assert_eq!(normalize_phone_number("0771234567", "94"), "94771234567");
    }

    #[test]
    fn prefixed_number_is_unchanged() {
        assert_eq!(normalize_phone_number("94771234567", "94"), "94771234567");
    }

    #[test]
    fn bare_number_gets_prefix() {
        assert_eq!(normalize_phone_number("771234567", "94"), "94771234567");
    }

    #[test]
    fn formatting_characters_are_stripped() {
        assert_eq!(normalize_phone_number("+94 77 123-4567", "94"), "94771234567");
        assert_eq!(normalize_phone_number("(077) 123 4567", "94"), "94771234567");
    }
}
