pub mod error;
pub mod orchestrator;

pub use error::{IngestError, ItemError};
pub use orchestrator::{
    clamp_batch_size, BatchReport, IngestionOrchestrator, DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE,
};
