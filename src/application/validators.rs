use validator::ValidateEmail;

use crate::app_error::{AppError, AppResult, FieldError};

/// Validates that the input looks like a valid email address
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.validate_email()
}

/// Contact numbers are 10 to 15 ASCII digits, nothing else.
pub fn is_valid_contact_number(number: &str) -> bool {
    (10..=15).contains(&number.len()) && number.chars().all(|c| c.is_ascii_digit())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Length check in characters, not bytes.
pub fn exceeds(value: &str, max_chars: usize) -> bool {
    value.chars().count() > max_chars
}

/// Collects field errors so a handler can report every bad field at once.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: &str) {
        self.0.push(FieldError::new(field, message));
    }

    /// Trims a required text field, recording an error when it is missing or blank.
    pub fn required(&mut self, field: &str, value: Option<&str>, message: &str) -> Option<String> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Some(v.to_string()),
            _ => {
                self.add(field, message);
                None
            }
        }
    }

    /// Trims an optional text field; a supplied-but-blank value is an error.
    pub fn non_blank(&mut self, field: &str, value: Option<&str>, message: &str) -> Option<String> {
        let v = value?.trim();
        if v.is_empty() {
            self.add(field, message);
            return None;
        }
        Some(v.to_string())
    }

    /// `required` on create, `non_blank` on partial update.
    pub fn text(
        &mut self,
        field: &str,
        value: Option<&str>,
        required: bool,
        message: &str,
    ) -> Option<String> {
        if required {
            self.required(field, value, message)
        } else {
            self.non_blank(field, value, message)
        }
    }

    pub fn max_chars(&mut self, field: &str, value: Option<&str>, max: usize, message: &str) {
        if value.is_some_and(|v| exceeds(v, max)) {
            self.add(field, message);
        }
    }

    /// Normalizes a present email, recording `message` when it is malformed.
    pub fn email(&mut self, field: &str, value: Option<String>, message: &str) -> Option<String> {
        let raw = value?;
        if is_valid_email(&raw) {
            Some(normalize_email(&raw))
        } else {
            self.add(field, message);
            None
        }
    }

    /// Parses an optional enum field, recording `message` when the value is not a member.
    pub fn parse_enum<T: std::str::FromStr>(
        &mut self,
        field: &str,
        value: Option<&str>,
        message: &str,
    ) -> Option<T> {
        let raw = value?;
        match raw.trim().parse::<T>() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                self.add(field, message);
                None
            }
        }
    }

    pub fn into_result(self) -> AppResult<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.0))
        }
    }
}
