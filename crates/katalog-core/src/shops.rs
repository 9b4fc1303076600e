use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::OfferType;
use crate::ConfigError;

pub const DEFAULT_RETRY_LIMIT: u32 = 3;
pub const MAX_RETRY_LIMIT: u32 = 5;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 3_000;
pub const MAX_RETRY_BACKOFF_MS: u64 = 60_000;

/// Per-shop extraction configuration.
///
/// `selectors` maps a logical field (`name`, `price`, `image`,
/// `description`, `category`, `brand`) to a comma-separated selector chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopConfig {
    pub id: String,
    pub name: String,
    pub base_url: String,
    #[serde(default)]
    pub selectors: BTreeMap<String, String>,
    /// Minimum spacing between two requests to this shop, in milliseconds.
    #[serde(default)]
    pub rate_limit_ms: u64,
    #[serde(default)]
    pub retry_limit: u32,
    #[serde(default)]
    pub retry_backoff_ms: u64,
    #[serde(default)]
    pub requires_js: bool,
    #[serde(default)]
    pub offer_type: OfferType,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Boilerplate stripped from the page `<title>` when it stands in for
    /// the product name, e.g. `" | Shop Name"`.
    #[serde(default)]
    pub title_suffixes: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

impl ShopConfig {
    /// The selector chain configured for `field`, if any.
    #[must_use]
    pub fn selector_chain(&self, field: &str) -> Option<&str> {
        self.selectors
            .get(field)
            .map(String::as_str)
            .filter(|chain| !chain.trim().is_empty())
    }

    /// Retry attempts after the first failure: unset means 3, capped at 5.
    #[must_use]
    pub fn effective_retry_limit(&self) -> u32 {
        match self.retry_limit {
            0 => DEFAULT_RETRY_LIMIT,
            n => n.min(MAX_RETRY_LIMIT),
        }
    }

    /// Base backoff: unset means 3s, capped at 60s.
    #[must_use]
    pub fn effective_retry_backoff_ms(&self) -> u64 {
        match self.retry_backoff_ms {
            0 => DEFAULT_RETRY_BACKOFF_MS,
            n => n.min(MAX_RETRY_BACKOFF_MS),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ShopsFile {
    pub shops: Vec<ShopConfig>,
}

/// Load and validate shop configurations from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_shops(path: &Path) -> Result<ShopsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ShopsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let shops_file: ShopsFile =
        serde_yaml::from_str(&content).map_err(ConfigError::ShopsFileParse)?;

    validate_shops(&shops_file)?;

    Ok(shops_file)
}

fn validate_shops(shops_file: &ShopsFile) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for shop in &shops_file.shops {
        if shop.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "shop id must be non-empty".to_string(),
            ));
        }

        if shop.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "shop '{}' has an empty name",
                shop.id
            )));
        }

        if !seen_ids.insert(shop.id.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate shop id: '{}'",
                shop.id
            )));
        }

        if !(shop.base_url.starts_with("http://") || shop.base_url.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "shop '{}' base_url must start with http:// or https://",
                shop.id
            )));
        }

        for field in ["name", "price"] {
            if shop.selector_chain(field).is_none() {
                return Err(ConfigError::Validation(format!(
                    "shop '{}' is missing a '{field}' selector chain",
                    shop.id
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "shops_test.rs"]
mod tests;
