use rust_decimal::Decimal;
use thiserror::Error;

use katalog_core::StoreError;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {url} (retry after {retry_after_secs}s)")]
    RateLimited { url: String, retry_after_secs: u64 },

    #[error("page not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid page URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("browser rendering failed for {url}: {reason}")]
    Browser { url: String, reason: String },

    #[error("browser rendering of {url} exceeded {budget_secs}s")]
    BrowserTimeout { url: String, budget_secs: u64 },

    #[error("shop {shop_id} requires JavaScript rendering but no browser backend is configured")]
    BrowserUnavailable { shop_id: String },

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("failed to save capture: {0}")]
    Store(#[from] StoreError),
}

/// A page could not be turned into a valid capture.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// Name or price is still unset after every strategy. Not retriable
    /// without a selector change.
    #[error("failed to extract essential data: {reason} (name: {partial_name:?}, price: {partial_price:?})")]
    Incomplete {
        reason: String,
        partial_name: Option<String>,
        partial_price: Option<Decimal>,
    },
}
