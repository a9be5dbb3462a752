use crate::utils::error::{PredictiveError, Result};

pub const REDACTED: &str = "<redacted>";

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: &str, reason: impl Into<String>) -> PredictiveError {
    PredictiveError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }

    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

/// Closed interval check. Values that do not compare (NaN) are rejected.
pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if !(value >= min && value <= max) {
        return Err(invalid(
            field_name,
            &value.to_string(),
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

/// Open interval check, used for ratios where both ends are meaningless.
pub fn validate_exclusive_range(field_name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if !(value > min && value < max) {
        return Err(invalid(
            field_name,
            &value.to_string(),
            format!("Value must be strictly between {} and {}", min, max),
        ));
    }
    Ok(())
}

pub fn validate_s3_bucket_name(field_name: &str, bucket_name: &str) -> Result<()> {
    if bucket_name.is_empty() {
        return Err(invalid(
            field_name,
            bucket_name,
            "S3 bucket name cannot be empty",
        ));
    }

    if bucket_name.len() < 3 || bucket_name.len() > 63 {
        return Err(invalid(
            field_name,
            bucket_name,
            "S3 bucket name must be between 3 and 63 characters",
        ));
    }

    if !bucket_name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(invalid(
            field_name,
            bucket_name,
            "S3 bucket name can only contain lowercase letters, numbers, hyphens, and dots",
        ));
    }

    if bucket_name.starts_with('-') || bucket_name.ends_with('-') {
        return Err(invalid(
            field_name,
            bucket_name,
            "S3 bucket name cannot start or end with a hyphen",
        ));
    }

    Ok(())
}

pub fn validate_aws_region(field_name: &str, region: &str) -> Result<()> {
    validate_non_empty_string(field_name, region)?;

    if !region
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(invalid(
            field_name,
            region,
            "AWS region can only contain lowercase letters, numbers, and hyphens",
        ));
    }

    Ok(())
}

pub fn validate_aws_access_key_id(field_name: &str, key_id: &str) -> Result<()> {
    if key_id.len() < 16 || key_id.len() > 128 {
        return Err(invalid(
            field_name,
            REDACTED,
            "Access key id must be between 16 and 128 characters",
        ));
    }

    if !key_id
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return Err(invalid(
            field_name,
            REDACTED,
            "Access key id can only contain uppercase letters and digits",
        ));
    }

    Ok(())
}

pub fn validate_aws_secret(field_name: &str, secret: &str) -> Result<()> {
    if secret.is_empty() {
        return Err(invalid(field_name, REDACTED, "Secret cannot be empty"));
    }

    if secret.chars().any(char::is_whitespace) {
        return Err(invalid(
            field_name,
            REDACTED,
            "Secret cannot contain whitespace",
        ));
    }

    Ok(())
}
