use crate::utils::error::{LedgerError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_database_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(LedgerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: String::new(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    // Never echo the raw URL back: it usually carries a password.
    let redacted = redact_url(url_str);
    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "postgres" | "postgresql" => {
                if url.host_str().map_or(true, str::is_empty) {
                    return Err(LedgerError::InvalidConfigValueError {
                        field: field_name.to_string(),
                        value: redacted,
                        reason: "URL has no host".to_string(),
                    });
                }
                Ok(())
            }
            scheme => Err(LedgerError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: redacted,
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(LedgerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: redacted,
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

/// Replaces the password component of a connection URL with `***`.
pub fn redact_url(url_str: &str) -> String {
    match Url::parse(url_str) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("***"));
            }
            url.to_string()
        }
        Err(_) => "<unparseable url>".to_string(),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(LedgerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(LedgerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(LedgerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LedgerError::ValidationError {
            message: format!("{} cannot be empty or whitespace-only", field_name),
        });
    }
    Ok(())
}

pub fn validate_at_least(field_name: &str, value: f64, min: f64) -> Result<()> {
    if !value.is_finite() || value < min {
        return Err(LedgerError::ValidationError {
            message: format!("{} must be at least {}, got {}", field_name, min, value),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(LedgerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}
