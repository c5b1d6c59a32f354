use crate::utils::error::{EtlError, Result};
use chrono::NaiveDate;
use url::Url;

pub const MIN_INTERVAL_MS: u32 = 100;
pub const MAX_INTERVAL_MS: u32 = 3_600_000;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(EtlError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
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
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// Parses a `YYYYMMDD` date. Eight digits alone are not enough: the digits
/// must name a real calendar day.
pub fn validate_date(field_name: &str, date: &str) -> Result<NaiveDate> {
    if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EtlError::invalid_parameter(
            field_name,
            date,
            "expected format YYYYMMDD",
        ));
    }

    NaiveDate::parse_from_str(date, "%Y%m%d")
        .map_err(|e| EtlError::invalid_parameter(field_name, date, format!("not a calendar date: {}", e)))
}

pub fn validate_date_range(start_date: &str, end_date: &str) -> Result<()> {
    let start = validate_date("start_date", start_date)?;
    let end = validate_date("end_date", end_date)?;
    if start > end {
        return Err(EtlError::invalid_parameter(
            "end_date",
            end_date,
            format!("end date is before start date {}", start_date),
        ));
    }
    Ok(())
}

/// `0` selects every expiration on bulk endpoints.
pub fn validate_expiration(exp: &str) -> Result<()> {
    if exp == "0" {
        return Ok(());
    }
    validate_date("exp", exp).map(|_| ())
}

pub fn validate_interval(field_name: &str, ivl: u32, allow_tick: bool) -> Result<()> {
    if allow_tick && ivl == 0 {
        return Ok(());
    }
    if !(MIN_INTERVAL_MS..=MAX_INTERVAL_MS).contains(&ivl) {
        return Err(EtlError::invalid_parameter(
            field_name,
            ivl.to_string(),
            format!(
                "must be between {} and {}",
                MIN_INTERVAL_MS, MAX_INTERVAL_MS
            ),
        ));
    }
    Ok(())
}

pub fn validate_symbol(field_name: &str, symbol: &str) -> Result<()> {
    if symbol.trim().is_empty() {
        return Err(EtlError::invalid_parameter(
            field_name,
            symbol,
            "symbol cannot be empty",
        ));
    }
    if symbol.contains(',') || symbol.chars().any(char::is_whitespace) {
        return Err(EtlError::invalid_parameter(
            field_name,
            symbol,
            "symbol cannot contain commas or whitespace",
        ));
    }
    Ok(())
}

pub fn validate_symbols<S: AsRef<str>>(field_name: &str, symbols: &[S]) -> Result<()> {
    if symbols.is_empty() {
        return Err(EtlError::invalid_parameter(
            field_name,
            "",
            "at least one symbol is required",
        ));
    }
    for symbol in symbols {
        validate_symbol(field_name, symbol.as_ref())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("base_url", "http://127.0.0.1:25510").is_ok());
        assert!(validate_url("base_url", "https://example.com").is_ok());
        assert!(validate_url("base_url", "").is_err());
        assert!(validate_url("base_url", "invalid-url").is_err());
        assert!(validate_url("base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_date() {
        assert!(validate_date("start_date", "20240101").is_ok());
        assert!(validate_date("start_date", "2024-01-01").is_err());
        assert!(validate_date("start_date", "2024011").is_err());
        assert!(validate_date("start_date", "20241301").is_err());
        assert!(validate_date("start_date", "20240230").is_err());
    }

    #[test]
    fn test_validate_date_range_rejects_reversed_dates() {
        assert!(validate_date_range("20240101", "20240131").is_ok());
        assert!(validate_date_range("20240101", "20240101").is_ok());

        let err = validate_date_range("20240131", "20240101").unwrap_err();
        match err {
            EtlError::InvalidParameterError { field, .. } => assert_eq!(field, "end_date"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_expiration_accepts_zero() {
        assert!(validate_expiration("0").is_ok());
        assert!(validate_expiration("20240119").is_ok());
        assert!(validate_expiration("00").is_err());
    }

    #[test]
    fn test_validate_interval() {
        assert!(validate_interval("ivl", 100, false).is_ok());
        assert!(validate_interval("ivl", 3_600_000, false).is_ok());
        assert!(validate_interval("ivl", 99, false).is_err());
        assert!(validate_interval("ivl", 3_600_001, false).is_err());
        assert!(validate_interval("ivl", 0, false).is_err());
        assert!(validate_interval("ivl", 0, true).is_ok());
        assert!(validate_interval("ivl", 50, true).is_err());
    }

    #[test]
    fn test_validate_symbols() {
        assert!(validate_symbols("symbols", &["AAPL", "MSFT"]).is_ok());
        assert!(validate_symbols::<&str>("symbols", &[]).is_err());
        assert!(validate_symbols("symbols", &["AAPL", " "]).is_err());
        assert!(validate_symbol("symbol", "AAPL,MSFT").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("timeout_secs", 60u64, 1, 3600).is_ok());
        assert!(validate_range("timeout_secs", 0u64, 1, 3600).is_err());
    }
}
