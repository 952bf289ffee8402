use thiserror::Error;

/// Top-level error type for the Mindwell workspace.
///
/// Storage backends, the remote mirror, and configuration loading all report
/// through this type. Crates with their own error enums implement
/// `From<MindwellError>` so `?` works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MindwellError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Malformed record {key}: {reason}")]
    MalformedRecord { key: String, reason: String },

    #[error("Remote mirror error: {0}")]
    Remote(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for MindwellError {
    fn from(err: toml::de::Error) -> Self {
        MindwellError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for MindwellError {
    fn from(err: toml::ser::Error) -> Self {
        MindwellError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for MindwellError {
    fn from(err: serde_json::Error) -> Self {
        MindwellError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Mindwell operations.
pub type Result<T> = std::result::Result<T, MindwellError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(MindwellError, &str)> = vec![
            (
                MindwellError::Config("bad key".to_string()),
                "Configuration error: bad key",
            ),
            (
                MindwellError::Storage("disk full".to_string()),
                "Storage error: disk full",
            ),
            (
                MindwellError::MalformedRecord {
                    key: "user_1234abcd/1234abcd-0000".to_string(),
                    reason: "missing field `messages`".to_string(),
                },
                "Malformed record user_1234abcd/1234abcd-0000: missing field `messages`",
            ),
            (
                MindwellError::Remote("connection refused".to_string()),
                "Remote mirror error: connection refused",
            ),
            (
                MindwellError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MindwellError = io_err.into();
        assert!(matches!(err, MindwellError::Io(_)));
        assert!(err.to_string().starts_with("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let err: MindwellError = err.unwrap_err().into();
        assert!(matches!(err, MindwellError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let err: MindwellError = err.unwrap_err().into();
        assert!(matches!(err, MindwellError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let value = io_result?;
            Ok(value.to_string())
        }

        assert_eq!(inner().unwrap(), "42");
    }
}
