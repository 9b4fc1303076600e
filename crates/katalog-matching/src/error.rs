use thiserror::Error;

use katalog_core::StoreError;

#[derive(Debug, Error)]
pub enum MatchingError {
    #[error("capture has no name to match on")]
    EmptyName,

    #[error("invalid match thresholds: exact {exact}, probable {probable}")]
    InvalidThresholds { exact: f64, probable: f64 },

    #[error("candidate lookup failed: {0}")]
    CandidateLookup(#[source] StoreError),

    #[error("invalid unit pattern for {canonical}: {source}")]
    UnitPattern {
        canonical: String,
        #[source]
        source: regex::Error,
    },
}
