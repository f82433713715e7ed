use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlatfigError {
    #[cfg(feature = "toml")]
    #[error("Failed to parse {origin}: {source}")]
    TomlError {
        origin: String,
        source: toml::de::Error,
    },

    #[cfg(feature = "json")]
    #[error("Failed to parse {origin}: {source}")]
    JsonError {
        origin: String,
        source: serde_json::Error,
    },

    #[error("Malformed line in {origin} (line {line}): {reason}")]
    PropertiesSyntax {
        origin: String,
        line: usize,
        reason: String,
    },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{value} is out of range of {target}")]
    OutOfRange { value: i64, target: &'static str },

    #[error("Expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_syntax_formats_correctly() {
        let err = FlatfigError::PropertiesSyntax {
            origin: "/etc/myapp/app.properties".into(),
            line: 7,
            reason: "missing '=' or ':' separator".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("app.properties"));
        assert!(msg.contains("line 7"));
        assert!(msg.contains("separator"));
    }

    #[test]
    fn out_of_range_names_value_and_target() {
        let err = FlatfigError::OutOfRange {
            value: 3_000_000_000,
            target: "i32",
        };
        assert_eq!(err.to_string(), "3000000000 is out of range of i32");
    }

    #[test]
    fn key_not_found_formats() {
        let err = FlatfigError::KeyNotFound("database.url".into());
        assert!(err.to_string().contains("database.url"));
    }
}
