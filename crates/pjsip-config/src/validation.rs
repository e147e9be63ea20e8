//! Input validation for values written into the section files

use crate::error::{ConfigStoreError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static EXTENSION_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").unwrap());
static CODEC_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{1,32}$").unwrap());

/// An extension must be a non-empty string of ASCII digits
pub fn validate_extension(extension: &str) -> Result<()> {
    if EXTENSION_REGEX.is_match(extension) {
        Ok(())
    } else {
        Err(ConfigStoreError::Validation(format!(
            "extension must be numeric, got {:?}",
            extension
        )))
    }
}

/// Validate a single codec name (e.g. `ulaw`, `g729`, `opus`)
pub fn validate_codec_name(codec: &str) -> Result<()> {
    if CODEC_REGEX.is_match(codec) {
        Ok(())
    } else {
        Err(ConfigStoreError::Validation(format!(
            "invalid codec name {:?}",
            codec
        )))
    }
}

/// Passwords are written verbatim as an option value, so they must stay on one line
pub fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(ConfigStoreError::Validation(
            "password must not be empty".to_string(),
        ));
    }
    if password.chars().any(|c| c.is_control()) {
        return Err(ConfigStoreError::Validation(
            "password must not contain control characters".to_string(),
        ));
    }
    if password != password.trim() {
        return Err(ConfigStoreError::Validation(
            "password must not start or end with whitespace".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_extensions_pass() {
        assert!(validate_extension("100").is_ok());
        assert!(validate_extension("0042").is_ok());
    }

    #[test]
    fn non_numeric_extensions_fail() {
        for bad in ["", "10a", "abc", "1 0", "-100", "１００"] {
            let err = validate_extension(bad).unwrap_err();
            assert!(matches!(err, ConfigStoreError::Validation(_)), "{bad:?}");
        }
    }

    #[test]
    fn codec_names() {
        assert!(validate_codec_name("g729").is_ok());
        assert!(validate_codec_name("slin16").is_ok());
        assert!(validate_codec_name("").is_err());
        assert!(validate_codec_name("ulaw;alaw").is_err());
    }

    #[test]
    fn passwords_stay_on_one_line() {
        assert!(validate_password("s3cret").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password("a\nb").is_err());
        assert!(validate_password(" padded").is_err());
    }
}
