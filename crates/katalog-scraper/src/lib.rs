pub mod error;
pub mod extract;
pub mod fetch;
pub mod price;
pub mod rate_limit;
pub mod runner;
pub mod url;

pub use error::{ExtractionError, ScraperError};
pub use extract::{FieldExtractor, PageContent};
#[cfg(feature = "chromium")]
pub use fetch::{ChromiumLauncher, ChromiumSession};
pub use fetch::{
    BrowserLauncher, BrowserRenderer, BrowserSession, PageSource, RenderTimings, StaticFetcher,
};
pub use price::{parse_price, ParsedPrice, PriceParseError, PriceParser};
pub use rate_limit::{retry_with_backoff, ShopThrottle};
pub use runner::{CaptureRunner, CaptureSummary, NoBrowser};
