//! Identifier checks.
//!
//! Database, table and column names are interpolated into statement text,
//! since SQLite cannot bind identifiers as parameters. They must match a
//! plain `[A-Za-z_][A-Za-z0-9_]*` shape first. Condition clauses and
//! declared column types are operator-trusted text and are not checked here.
use crate::core::{CrudError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Returns `name` unchanged if it is a safe identifier.
pub fn check_identifier(name: &str) -> Result<&str> {
    if IDENTIFIER.is_match(name) {
        Ok(name)
    } else {
        Err(CrudError::InvalidIdentifier(name.to_string()))
    }
}

pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_names() {
        for name in ["Employees", "_tmp", "col_1", "a"] {
            assert!(check_identifier(name).is_ok(), "{} should be accepted", name);
        }
    }

    #[test]
    fn test_rejects_unsafe_names() {
        for name in ["", "1abc", "name; DROP TABLE x", "a-b", "a b", "t'", "\"quoted\""] {
            match check_identifier(name) {
                Err(CrudError::InvalidIdentifier(n)) => assert_eq!(n, name),
                other => panic!("Expected InvalidIdentifier for {:?}, got {:?}", name, other),
            }
        }
    }
}
