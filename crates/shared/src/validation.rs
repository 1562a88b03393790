//! Common validation utilities.

use chrono::{DateTime, NaiveDateTime, Utc};
use validator::ValidationError;

/// Wire format of a booking time, interpreted as UTC.
pub const BOOKING_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

lazy_static::lazy_static! {
    static ref POSTAL_CODE_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Za-z]\d[A-Za-z] ?\d[A-Za-z]\d$").unwrap();
}

/// Validates a Canadian-style postal code (`V1V1V1` or `V1V 1V1`).
pub fn validate_postal_code(code: &str) -> Result<(), ValidationError> {
    if POSTAL_CODE_REGEX.is_match(code) {
        Ok(())
    } else {
        let mut err = ValidationError::new("postal_code_format");
        err.message = Some("Postal code must look like V1V1V1".into());
        Err(err)
    }
}

/// Validates that a string is not empty after trimming.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value cannot be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Validates that a booking time string parses with [`BOOKING_TIME_FORMAT`].
pub fn validate_booking_time(value: &str) -> Result<(), ValidationError> {
    parse_booking_time(value).map(|_| ())
}

/// Parses a booking time such as `2030-01-01 10:00` into a UTC timestamp.
pub fn parse_booking_time(value: &str) -> Result<DateTime<Utc>, ValidationError> {
    NaiveDateTime::parse_from_str(value.trim(), BOOKING_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| {
            let mut err = ValidationError::new("booking_time_format");
            err.message = Some("Booking time must be formatted as YYYY-MM-DD HH:MM".into());
            err
        })
}

/// Normalizes a postal code to uppercase without inner whitespace.
pub fn normalize_postal_code(code: &str) -> String {
    code.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_validate_postal_code() {
        assert!(validate_postal_code("V1V1V1").is_ok());
        assert!(validate_postal_code("v6t 1z4").is_ok());
        assert!(validate_postal_code("12345").is_err());
        assert!(validate_postal_code("").is_err());
    }

    #[test]
    fn test_validate_postal_code_error_message() {
        let err = validate_postal_code("nope").unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Postal code must look like V1V1V1"
        );
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Evening Doubles").is_ok());
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank("").is_err());
    }

    #[test]
    fn test_parse_booking_time() {
        let ts = parse_booking_time("2030-01-01 10:00").unwrap();
        assert_eq!(ts.year(), 2030);
        assert_eq!(ts.month(), 1);
        assert_eq!(ts.hour(), 10);
        assert_eq!(ts.minute(), 0);
    }

    #[test]
    fn test_parse_booking_time_rejects_other_formats() {
        assert!(parse_booking_time("2030-01-01T10:00:00Z").is_err());
        assert!(parse_booking_time("tomorrow").is_err());
        assert!(validate_booking_time("2030-13-01 10:00").is_err());
    }

    #[test]
    fn test_normalize_postal_code() {
        assert_eq!(normalize_postal_code("v6t 1z4"), "V6T1Z4");
        assert_eq!(normalize_postal_code("V1V1V1"), "V1V1V1");
    }
}
