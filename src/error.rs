use thiserror::Error;

/// Any error raised while driving the mdb-tools suite or shaping its output.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum MdbError {
    /// External command was missing, failed to spawn, or exited non-zero
    #[error("external tool `{program}` failed: {reason}")]
    ExternalTool { program: String, reason: String },

    /// Tool output was not valid under the configured encoding
    #[error("{encoding} decode of tool output failed: {detail}")]
    Decode { encoding: String, detail: String },

    /// Type inference was requested for a table the schema dump does not contain
    #[error("table `{0}` not found in the scraped schema")]
    SchemaLookup(String),

    /// A CSV cell could not be parsed into the column's resolved type
    #[error("conversion error: {0}")]
    Conversion(String),

    /// CSV error: malformed rows surface unmodified
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// An error from polars
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl MdbError {
    pub fn external_tool<S: Into<String>>(program: S, reason: impl ToString) -> Self {
        Self::ExternalTool {
            program: program.into(),
            reason: reason.to_string(),
        }
    }

    pub fn decode<S: Into<String>>(encoding: S, detail: impl ToString) -> Self {
        Self::Decode {
            encoding: encoding.into(),
            detail: detail.to_string(),
        }
    }

    pub fn conversion<S: Into<String>>(msg: S) -> Self {
        Self::Conversion(msg.into())
    }
}

/// Alias for fallible operations in this crate
pub type MdbResult<T> = Result<T, MdbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let errors = vec![
            MdbError::external_tool("mdb-schema", "No such file or directory"),
            MdbError::decode("utf-8", "invalid byte sequence"),
            MdbError::SchemaLookup("Orders".to_string()),
            MdbError::conversion("cannot parse 'abc' as i64"),
        ];

        for err in errors {
            assert!(!format!("{err}").is_empty());
        }
    }

    #[test]
    fn test_schema_lookup_names_the_table() {
        let err = MdbError::SchemaLookup("Foo".to_string());
        assert!(format!("{err}").contains("Foo"));
    }

    #[test]
    fn test_helper_constructors() {
        let err = MdbError::external_tool("mdb-export", "exited with status 1");
        assert!(matches!(err, MdbError::ExternalTool { program, .. } if program == "mdb-export"));

        let err = MdbError::decode("iso-8859-1", "boom");
        assert!(matches!(err, MdbError::Decode { encoding, .. } if encoding == "iso-8859-1"));
    }
}
