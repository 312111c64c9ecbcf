//! Input validation for API requests.
//!
//! Validators return `Result<(), String>`; handlers collect them into a
//! single response with `ValidationErrorBuilder::check`.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Pragmatic email check: one `@`, no whitespace, a dotted domain
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[^@\s]+@[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?)+$"
    ).unwrap();

    /// Digits with optional leading `+` and common separators
    static ref PHONE_REGEX: Regex = Regex::new(
        r"^\+?[0-9][0-9 ()./-]{3,30}$"
    ).unwrap();
}

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PHONE_LENGTH: usize = 20;

/// Validate a required free-text field such as a title or a name
pub fn validate_required(label: &str, value: &str, max_len: usize) -> Result<(), String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("{} is required", label));
    }

    if value.chars().count() > max_len {
        return Err(format!("{} is too long (max {} characters)", label, max_len));
    }

    Ok(())
}

/// Validate an optional replacement for a required field (partial updates)
pub fn validate_optional(label: &str, value: &Option<String>, max_len: usize) -> Result<(), String> {
    match value {
        Some(v) => validate_required(label, v, max_len),
        None => Ok(()),
    }
}

/// Validate the length of an optional free-text field
pub fn validate_max_len(label: &str, value: Option<&str>, max_len: usize) -> Result<(), String> {
    match value {
        Some(v) if v.chars().count() > max_len => {
            Err(format!("{} is too long (max {} characters)", label, max_len))
        }
        _ => Ok(()),
    }
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate a phone number (optional field)
pub fn validate_phone(phone: Option<&str>) -> Result<(), String> {
    if let Some(p) = phone {
        if p.is_empty() {
            return Ok(());
        }

        if p.chars().count() > MAX_PHONE_LENGTH {
            return Err(format!(
                "Phone number is too long (max {} characters)",
                MAX_PHONE_LENGTH
            ));
        }

        if !PHONE_REGEX.is_match(p) {
            return Err("Invalid phone number format".to_string());
        }
    }

    Ok(())
}

/// Validate a monetary amount (optional field)
pub fn validate_amount(amount: Option<f64>) -> Result<(), String> {
    if let Some(a) = amount {
        if !a.is_finite() {
            return Err("Amount must be a finite number".to_string());
        }
        if a < 0.0 {
            return Err("Amount must not be negative".to_string());
        }
    }

    Ok(())
}

/// Validate that a salary range is ordered when both bounds are present
pub fn validate_salary_range(min: Option<f64>, max: Option<f64>) -> Result<(), String> {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err("salary_range_min must not exceed salary_range_max".to_string());
        }
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ));
    }

    if password.len() > 1024 {
        return Err("Password is too long".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required() {
        assert!(validate_required("Title", "Engineering", 200).is_ok());
        assert!(validate_required("Title", "", 200).is_err());
        assert!(validate_required("Title", "   ", 200).is_err());
        assert!(validate_required("Title", &"x".repeat(201), 200).is_err());
        assert!(validate_optional("Title", &None, 200).is_ok());
        assert!(validate_optional("Title", &Some(String::new()), 200).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("first.last+hr@mail.example.co.uk").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("ada").is_err());
        assert!(validate_email("ada@localhost").is_err());
        assert!(validate_email("ada lovelace@example.com").is_err());
        assert!(validate_email("ada@@example.com").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone(Some("+1 (555) 010-9999")).is_ok());
        assert!(validate_phone(Some("0123456789")).is_ok());
        assert!(validate_phone(None).is_ok());
        assert!(validate_phone(Some("")).is_ok());
        assert!(validate_phone(Some("+12345678901234567890")).is_err());

        assert!(validate_phone(Some("call me")).is_err());
        assert!(validate_phone(Some("12")).is_err());
    }

    #[test]
    fn test_validate_max_len() {
        assert!(validate_max_len("City", None, 50).is_ok());
        assert!(validate_max_len("City", Some("Zürich"), 50).is_ok());
        assert!(validate_max_len("City", Some(&"é".repeat(50)), 50).is_ok());
        assert!(validate_max_len("City", Some(&"é".repeat(51)), 50).is_err());
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_amount(Some(0.0)).is_ok());
        assert!(validate_amount(Some(120_000.5)).is_ok());
        assert!(validate_amount(None).is_ok());
        assert!(validate_amount(Some(-1.0)).is_err());
        assert!(validate_amount(Some(f64::NAN)).is_err());

        assert!(validate_salary_range(Some(10.0), Some(20.0)).is_ok());
        assert!(validate_salary_range(Some(20.0), None).is_ok());
        assert!(validate_salary_range(Some(30.0), Some(20.0)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("correct horse").is_ok());
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password("").is_err());
    }
}
