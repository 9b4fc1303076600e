pub mod app_config;
pub mod capture;
pub mod catalog;
pub mod config;
pub mod shops;
pub mod store;

pub use app_config::{AppConfig, Environment};
pub use capture::{CaptureRejection, RawCapture};
pub use catalog::{
    CanonicalEntity, MatchConfidence, OfferType, PricePoint, PriceRecord, ProductMatch,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use shops::{load_shops, ShopConfig, ShopsFile};
pub use store::{
    CatalogReader, CatalogWriter, MatchAuditSink, PriceHistorySink, RawCaptureReader,
    RawCaptureWriter, StalePrice, StoreError,
};

use thiserror::Error;

/// Currency assumed when a price string or markup carries none.
pub const DEFAULT_HOME_CURRENCY: &str = "RSD";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read shops file {path}: {source}")]
    ShopsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse shops file: {0}")]
    ShopsFileParse(#[source] serde_yaml::Error),

    #[error("shops validation error: {0}")]
    Validation(String),
}
