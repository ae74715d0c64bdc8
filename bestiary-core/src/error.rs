use thiserror::Error;

#[derive(Error, Debug)]
pub enum BestiaryError {
    #[error("Statblock too short: found {lines} non-empty lines, need at least 4")]
    Structural { lines: usize },

    #[error("No {format} type/stats line found in statblock")]
    AnchorNotFound { format: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl BestiaryError {
    /// True for the two structural failures raised by the statblock parser.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            BestiaryError::Structural { .. } | BestiaryError::AnchorNotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BestiaryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_parse_failure() {
        assert!(BestiaryError::Structural { lines: 2 }.is_parse_failure());
        assert!(
            BestiaryError::AnchorNotFound { format: "native".to_string() }.is_parse_failure()
        );
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(!BestiaryError::from(io).is_parse_failure());
        assert!(!BestiaryError::NotFound("creature 7".to_string()).is_parse_failure());
    }
}
