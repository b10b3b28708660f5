//! Value validation for interactive inserts.
//!
//! A declared column type is reduced to a `ValueKind`, and each entered
//! value is checked against it before it is bound into an INSERT.
use crate::core::{CrudError, Result};

/// How an entered value is checked for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Non-empty, decimal digits only
    Integer,
    /// Anything that parses as a floating point literal
    Float,
    /// Passed through unchecked
    Text,
}

impl ValueKind {
    /// Classifies a declared type such as `INT`, `INTEGER`, `FLOAT`,
    /// `VARCHAR(50)` or `REAL`.
    pub fn from_declared_type(declared: &str) -> Self {
        let lower = declared.trim().to_lowercase();
        if lower.starts_with("int")
            || lower.starts_with("bigint")
            || lower.starts_with("smallint")
            || lower.starts_with("tinyint")
        {
            ValueKind::Integer
        } else if lower.starts_with("float")
            || lower.starts_with("real")
            || lower.starts_with("double")
        {
            ValueKind::Float
        } else {
            ValueKind::Text
        }
    }
}

/// Checks `value` against the declared type of its column.
///
/// Returns `CrudError::Validation` with an operator-facing message on failure.
pub fn validate_value(value: &str, declared_type: &str) -> Result<()> {
    match ValueKind::from_declared_type(declared_type) {
        ValueKind::Integer => {
            if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
                return Err(CrudError::Validation(format!(
                    "Invalid value '{}' for integer column.",
                    value
                )));
            }
        }
        ValueKind::Float => {
            if value.trim().parse::<f64>().is_err() {
                return Err(CrudError::Validation(format!(
                    "Invalid value '{}' for float column.",
                    value
                )));
            }
        }
        ValueKind::Text => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(ValueKind::from_declared_type("INT"), ValueKind::Integer);
        assert_eq!(ValueKind::from_declared_type("integer"), ValueKind::Integer);
        assert_eq!(ValueKind::from_declared_type("BIGINT"), ValueKind::Integer);
        assert_eq!(ValueKind::from_declared_type("FLOAT"), ValueKind::Float);
        assert_eq!(ValueKind::from_declared_type("REAL"), ValueKind::Float);
        assert_eq!(ValueKind::from_declared_type("VARCHAR(50)"), ValueKind::Text);
        assert_eq!(ValueKind::from_declared_type(""), ValueKind::Text);
    }

    #[test]
    fn test_integer_values() {
        assert!(validate_value("42", "INT").is_ok());
        assert!(validate_value("007", "INT").is_ok());
        assert!(validate_value("-1", "INT").is_err());
        assert!(validate_value("4.2", "INT").is_err());
        assert!(validate_value("", "INT").is_err());
    }

    #[test]
    fn test_float_values() {
        for ok in ["3.14", "-2", "0", "50000.0"] {
            assert!(validate_value(ok, "FLOAT").is_ok(), "{} should pass", ok);
        }
        let err = validate_value("abc", "FLOAT").unwrap_err();
        assert_eq!(err.to_string(), "Invalid value 'abc' for float column.");
    }

    #[test]
    fn test_text_passes_through() {
        assert!(validate_value("anything at all", "VARCHAR(50)").is_ok());
        assert!(validate_value("", "TEXT").is_ok());
    }
}
