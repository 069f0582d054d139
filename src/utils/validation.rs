use crate::utils::error::{KyoError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl ToString, reason: impl Into<String>) -> KyoError {
    KyoError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Endpoints must be absolute http(s) URLs.
pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }

    let url = Url::parse(url_str)
        .map_err(|e| invalid(field_name, url_str, format!("Invalid URL format: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid(
            field_name,
            url_str,
            format!("Unsupported URL scheme: {scheme}"),
        )),
    }
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(invalid(field_name, value, format!("Value must be at least {min_value}")));
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| KyoError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field_name, value, "Value cannot be empty or whitespace-only"));
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
        return Err(invalid(
            field_name,
            value,
            format!("Value must be between {min} and {max}"),
        ));
    }
    Ok(())
}

/// Allowed CORS origins must be bare origins, `*` is rejected.
pub fn validate_origin(field_name: &str, origin: &str) -> Result<()> {
    validate_url(field_name, origin)?;

    let url = Url::parse(origin).map_err(|e| invalid(field_name, origin, e.to_string()))?;
    if url.path() != "/" || url.query().is_some() || origin.ends_with('/') {
        return Err(invalid(
            field_name,
            origin,
            "Origin must not contain a path, query or trailing slash",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("firestore.base_url", "https://firestore.googleapis.com").is_ok());
        assert!(validate_url("firestore.base_url", "http://127.0.0.1:8080").is_ok());
        assert!(validate_url("firestore.base_url", "").is_err());
        assert!(validate_url("firestore.base_url", "invalid-url").is_err());
        assert!(validate_url("firestore.base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("images.max_files", 5, 1).is_ok());
        assert!(validate_positive_number("images.max_files", 0, 1).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("server.port", 3000u16, 1, u16::MAX).is_ok());
        assert!(validate_range("server.port", 0u16, 1, u16::MAX).is_err());
    }

    #[test]
    fn test_validate_origin() {
        assert!(validate_origin("server.cors_origins", "https://kyowear.id").is_ok());
        assert!(validate_origin("server.cors_origins", "https://kyowear.id/").is_err());
        assert!(validate_origin("server.cors_origins", "https://kyowear.id/shop").is_err());
        assert!(validate_origin("server.cors_origins", "*").is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some("katalog".to_string());
        let missing: Option<String> = None;
        assert_eq!(
            validate_required_field("firestore.project_id", &present).unwrap(),
            "katalog"
        );
        assert!(matches!(
            validate_required_field("firestore.project_id", &missing),
            Err(KyoError::MissingConfigError { .. })
        ));
    }
}
