//! Error types for bptindex.

use thiserror::Error;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in bptindex.
///
/// Two kinds matter to callers of the tree itself:
/// - [`Error::DuplicateKey`] is expected and recoverable. The tree is untouched.
/// - [`Error::InvariantViolation`] is a defect signal. A correct insert/find
///   never produces it.
///
/// The remaining variants come from configuration and fixture loading.
#[derive(Debug, Error)]
pub enum Error {
    /// Attempted to insert a key that is already present.
    #[error("duplicate key: {0:?}")]
    DuplicateKey(String),

    /// The tree's structural invariants are broken.
    ///
    /// This indicates a bug, e.g. ancestor resolution reaching a leaf
    /// without finding its target, or a child reference pointing nowhere.
    #[error("structural invariant violated: {0}")]
    InvariantViolation(String),

    /// Requested node capacity is too small to split.
    #[error("invalid max_entries {max_entries}: must be at least {min}")]
    InvalidConfig { max_entries: usize, min: usize },

    /// I/O error while reading a fixture file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV decoding error while reading a fixture.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A fixture row did not carry both a key and a value.
    #[error("malformed fixture row at line {line}: expected 2 fields, found {fields}")]
    MalformedRow { line: u64, fields: usize },
}

impl Error {
    /// Shorthand used by the tree internals for corruption reports.
    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        Error::InvariantViolation(msg.into())
    }

    /// Whether this error is the caller-recoverable duplicate case.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Error::DuplicateKey(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::DuplicateKey("d".to_string());
        assert_eq!(format!("{}", err), "duplicate key: \"d\"");

        let err = Error::InvalidConfig {
            max_entries: 2,
            min: 3,
        };
        assert_eq!(
            format!("{}", err),
            "invalid max_entries 2: must be at least 3"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        match err {
            Error::Io(_) => {} // Success
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_is_duplicate_key() {
        assert!(Error::DuplicateKey("a".into()).is_duplicate_key());
        assert!(!Error::corrupt("broken").is_duplicate_key());
    }

    #[test]
    fn test_result_type_alias() {
        fn might_fail() -> Result<u32> {
            Ok(42)
        }

        assert_eq!(might_fail().unwrap(), 42);
    }
}
