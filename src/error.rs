//! Error types shared by the splitter and the EPG extractor.

use std::fmt;

use thiserror::Error;

/// PSI tables the splitter cannot work without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Pat,
    Pmt,
    PcrPid,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Table::Pat => f.write_str("PAT"),
            Table::Pmt => f.write_str("PMT"),
            Table::PcrPid => f.write_str("PCR_PID"),
        }
    }
}

/// Every fatal condition aborts the invocation; nothing is retried.
#[derive(Error, Debug)]
pub enum Error {
    /// Input bytes do not have the structure the operation needs.
    #[error("malformed input: {0}")]
    Malformed(String),

    /// A table required to select the program never showed up.
    #[error("required table not found: {0}")]
    TableNotFound(Table),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to serialize EPG record: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Error::Malformed(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_not_found_names_the_table() {
        assert_eq!(
            Error::TableNotFound(Table::Pmt).to_string(),
            "required table not found: PMT"
        );
        assert_eq!(
            Error::TableNotFound(Table::PcrPid).to_string(),
            "required table not found: PCR_PID"
        );
    }

    #[test]
    fn io_errors_convert() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, Error::Io(_)));
    }
}
