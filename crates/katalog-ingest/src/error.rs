use thiserror::Error;

use katalog_core::{CaptureRejection, StoreError};
use katalog_matching::MatchingError;

/// Errors that end a batch. Everything else is counted per item.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to load unprocessed captures: {source}")]
    LoadBatch {
        #[source]
        source: StoreError,
    },

    #[error("batch cancelled after {processed} processed captures")]
    Cancelled { processed: usize },
}

/// Why a single capture did not reach the processed state.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("invalid capture: {0}")]
    InvalidCapture(#[from] CaptureRejection),

    #[error("entity resolution failed: {0}")]
    Resolution(#[from] MatchingError),

    #[error("failed to {stage}: {source}")]
    Persistence {
        stage: &'static str,
        #[source]
        source: StoreError,
    },
}
