//! Field rules shared by the registration and profile-update payloads.

use crate::error::FieldErrors;

pub const MAX_NAME_LEN: usize = 128;
pub const MAX_ADDRESS_LEN: usize = 256;
pub const MIN_PASSWORD_LEN: usize = 8;
// bcrypt silently ignores anything past 72 bytes.
pub const MAX_PASSWORD_BYTES: usize = 72;

type Check = Result<(), String>;

/// Accumulates failures so a client sees every bad field in one response.
#[derive(Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn check(&mut self, field: &str, result: Check) {
        if let Err(message) = result {
            self.errors.insert(field.to_string(), message);
        }
    }

    pub fn finish<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }
}

pub fn email(value: &str) -> Check {
    if value.is_empty() {
        return Err("is required".into());
    }
    let mut parts = value.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err("must contain exactly one '@'".into());
    };
    if local.is_empty() || value.chars().any(char::is_whitespace) {
        return Err("is not a valid email address".into());
    }
    match domain.find('.') {
        Some(_) if !domain.starts_with('.') && !domain.ends_with('.') => Ok(()),
        _ => Err("is not a valid email address".into()),
    }
}

pub fn username(value: &str) -> Check {
    let len = value.chars().count();
    if !(3..=32).contains(&len) {
        return Err("must be between 3 and 32 characters".into());
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err("may only contain letters, digits, '_', '.' and '-'".into());
    }
    Ok(())
}

pub fn name(value: &str, max: usize) -> Check {
    if value.is_empty() {
        return Err("is required".into());
    }
    if value.chars().count() > max {
        return Err(format!("must be at most {max} characters"));
    }
    Ok(())
}

pub fn telephone(value: &str) -> Check {
    let len = value.chars().count();
    if !(7..=20).contains(&len) {
        return Err("must be between 7 and 20 characters".into());
    }
    let body = value.strip_prefix('+').unwrap_or(value);
    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '-' | '(' | ')' | ' '))
    {
        return Err("may only contain digits, spaces, '-', '(' and ')' after an optional '+'".into());
    }
    if body.chars().filter(char::is_ascii_digit).count() < 7 {
        return Err("must contain at least 7 digits".into());
    }
    Ok(())
}

pub fn password(value: &str) -> Check {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!("must be at least {MIN_PASSWORD_LEN} characters"));
    }
    if value.len() > MAX_PASSWORD_BYTES {
        return Err(format!("must be at most {MAX_PASSWORD_BYTES} bytes"));
    }
    Ok(())
}
