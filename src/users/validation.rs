use lazy_static::lazy_static;
use regex::Regex;

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Collects every violated rule so clients can show them all at once.
pub fn validate_password_complexity(password: &str) -> Vec<String> {
    let mut messages = Vec::new();

    if password.chars().count() < 8 {
        messages.push("password must be at least 8 characters".to_string());
    }

    let mut lower = 0;
    let mut upper = 0;
    let mut digits = 0;
    let mut symbols = 0;
    for c in password.chars() {
        if c.is_ascii_lowercase() {
            lower += 1;
        } else if c.is_ascii_uppercase() {
            upper += 1;
        } else if c.is_ascii_digit() {
            digits += 1;
        } else {
            symbols += 1;
        }
    }

    if lower == 0 {
        messages.push("password must contain a lowercase letter".to_string());
    }
    if upper == 0 {
        messages.push("password must contain an uppercase letter".to_string());
    }
    if digits == 0 {
        messages.push("password must contain a digit".to_string());
    }
    if symbols == 0 {
        messages.push("password must contain a symbol".to_string());
    }

    messages
}

pub fn validate_name(name: &str) -> Option<String> {
    if name.chars().count() < 3 {
        Some("name must be at least 3 characters".to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_emails() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.org"));
    }

    #[test]
    fn rejects_malformed_emails() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("has space@example.com"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn strong_password_passes() {
        assert!(validate_password_complexity("Abcd1234!").is_empty());
    }

    #[test]
    fn all_violated_rules_are_enumerated() {
        // Short, no uppercase, no digit, no symbol.
        let messages = validate_password_complexity("abc");
        assert_eq!(messages.len(), 4);
        assert!(messages.iter().any(|m| m.contains("8 characters")));
        assert!(messages.iter().any(|m| m.contains("uppercase")));
        assert!(messages.iter().any(|m| m.contains("digit")));
        assert!(messages.iter().any(|m| m.contains("symbol")));
    }

    #[test]
    fn single_missing_rule_is_reported_alone() {
        let messages = validate_password_complexity("Abcdefg1");
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("symbol"));
    }

    #[test]
    fn name_minimum_length() {
        assert!(validate_name("Al").is_some());
        assert!(validate_name("Ana").is_none());
    }
}
