//! Input normalisation shared by the request DTOs

use crate::error::ApiError;

pub const EMAIL_MAX_LEN: usize = 100;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 128;
pub const COMPANY_NAME_MAX_LEN: usize = 100;
pub const INDUSTRY_MAX_LEN: usize = 100;
pub const TENDER_TITLE_MAX_LEN: usize = 150;
pub const SERVICE_MAX_LEN: usize = 100;
pub const MAX_SERVICES: usize = 50;

/// Trim a required text field and enforce its length limit.
pub fn required_text(field: &str, value: &str, max_len: usize) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::bad_request(format!("{} is required", field)));
    }
    if value.chars().count() > max_len {
        return Err(ApiError::bad_request(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(value.to_string())
}

/// Trim free text; blank becomes `None`.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Normalise an email address to lowercase and check its shape.
pub fn normalize_email(email: &str) -> Result<String, ApiError> {
    let email = email.trim().to_lowercase();

    if email.is_empty() {
        return Err(ApiError::bad_request("email is required"));
    }
    if email.chars().count() > EMAIL_MAX_LEN {
        return Err(ApiError::bad_request(format!(
            "email must be at most {} characters",
            EMAIL_MAX_LEN
        )));
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(ApiError::bad_request("email is not a valid address"));
    }

    Ok(email)
}

pub fn check_password(password: &str) -> Result<(), ApiError> {
    let len = password.chars().count();
    if len < PASSWORD_MIN_LEN {
        return Err(ApiError::bad_request(format!(
            "password must be at least {} characters",
            PASSWORD_MIN_LEN
        )));
    }
    if len > PASSWORD_MAX_LEN {
        return Err(ApiError::bad_request(format!(
            "password must be at most {} characters",
            PASSWORD_MAX_LEN
        )));
    }
    Ok(())
}

/// Trim service keywords, drop blanks and case-insensitive duplicates.
pub fn normalize_services(services: Vec<String>) -> Result<Vec<String>, ApiError> {
    let mut out: Vec<String> = Vec::with_capacity(services.len());

    for service in services {
        let service = service.trim();
        if service.is_empty() {
            continue;
        }
        if service.chars().count() > SERVICE_MAX_LEN {
            return Err(ApiError::bad_request(format!(
                "services entries must be at most {} characters",
                SERVICE_MAX_LEN
            )));
        }
        if !out.iter().any(|s| s.eq_ignore_ascii_case(service)) {
            out.push(service.to_string());
        }
    }

    if out.len() > MAX_SERVICES {
        return Err(ApiError::bad_request(format!(
            "at most {} services are allowed",
            MAX_SERVICES
        )));
    }

    Ok(out)
}
