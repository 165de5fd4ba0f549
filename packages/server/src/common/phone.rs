/// Normalize a phone number for lookup and storage.
///
/// Strips everything except ASCII digits, keeping a single leading `+`
/// if the raw input starts with one. The normalized form is what gets
/// encrypted at signup, so every comparison path must normalize first.
pub fn normalize_phone(input: &str) -> String {
    let trimmed = input.trim();
    let has_plus = trimmed.starts_with('+');

    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();

    if has_plus {
        format!("+{digits}")
    } else {
        digits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_punctuation() {
        assert_eq!(normalize_phone("+1 (555) 010-2030"), "+15550102030");
    }

    #[test]
    fn test_plain_digits_unchanged() {
        assert_eq!(normalize_phone("15550102030"), "15550102030");
    }

    #[test]
    fn test_keeps_single_leading_plus_only() {
        assert_eq!(normalize_phone("+1+555+0102030"), "+15550102030");
        assert_eq!(normalize_phone("1+5550102030"), "15550102030");
    }

    #[test]
    fn test_whitespace_and_letters_dropped() {
        assert_eq!(normalize_phone("  +52 55 WHATSAPP 1234 "), "+52551234");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_phone(""), "");
        assert_eq!(normalize_phone("abc"), "");
    }
}
