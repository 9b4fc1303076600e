//! Page fetch backends.
//!
//! A [`StaticFetcher`] downloads raw HTML; a [`BrowserRenderer`] drives a
//! headless browser for shops that render prices with JavaScript. The
//! caller picks the backend per shop. Both return a [`PageContent`] that goes
//! through the same extractor.

mod browser;
#[cfg(feature = "chromium")]
mod chromium;
mod static_html;

use std::future::Future;

use crate::error::ScraperError;
use crate::extract::PageContent;

pub use browser::{BrowserLauncher, BrowserRenderer, BrowserSession, RenderTimings};
#[cfg(feature = "chromium")]
pub use chromium::{ChromiumLauncher, ChromiumSession};
pub use static_html::StaticFetcher;

pub trait PageSource: Send + Sync {
    fn fetch_page(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<PageContent, ScraperError>> + Send;
}
