//! Error types for the core.
//!
//! Resolution gaps, malformed queries and empty results are not errors;
//! they degrade to fewer filters or an empty [`ResultSet`](crate::ResultSet).
//! Only corpus acquisition can fail.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The corpus provider could not produce a usable corpus.
    #[error("Acquisition failed: {0}")]
    Acquisition(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error means the corpus is unavailable for the session.
    pub fn is_acquisition(&self) -> bool {
        matches!(self, Error::Acquisition(_) | Error::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_errors_count_as_acquisition() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "normas.csv").into();
        assert!(err.is_acquisition());
        assert_eq!(err.to_string(), "IO error: normas.csv");
        assert!(Error::Acquisition("portal down".into()).is_acquisition());
    }
}
