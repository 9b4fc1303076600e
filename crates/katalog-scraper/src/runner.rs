//! Fetch, extract, and persist one product page per call.

use std::time::Duration;

use katalog_core::{RawCapture, RawCaptureWriter, ShopConfig};

use crate::error::ScraperError;
use crate::extract::{FieldExtractor, PageContent};
use crate::fetch::{PageSource, StaticFetcher};
use crate::rate_limit::{retry_with_backoff, ShopThrottle};

/// Placeholder browser backend for runners built without one.
#[derive(Debug, Clone, Copy)]
pub enum NoBrowser {}

impl PageSource for NoBrowser {
    async fn fetch_page(&self, _url: &str) -> Result<PageContent, ScraperError> {
        match *self {}
    }
}

/// Totals for a multi-URL capture run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureSummary {
    pub saved: usize,
    pub failed: usize,
}

pub struct CaptureRunner<W, B = NoBrowser> {
    fetcher: StaticFetcher,
    browser: Option<B>,
    extractor: FieldExtractor,
    throttle: ShopThrottle,
    writer: W,
}

impl<W: RawCaptureWriter> CaptureRunner<W, NoBrowser> {
    #[must_use]
    pub fn new(fetcher: StaticFetcher, extractor: FieldExtractor, writer: W) -> Self {
        Self {
            fetcher,
            browser: None,
            extractor,
            throttle: ShopThrottle::new(),
            writer,
        }
    }
}

impl<W: RawCaptureWriter, B: PageSource> CaptureRunner<W, B> {
    /// Adds a browser backend for shops marked `requires_js`.
    #[must_use]
    pub fn with_browser<B2: PageSource>(self, browser: B2) -> CaptureRunner<W, B2> {
        CaptureRunner {
            fetcher: self.fetcher,
            browser: Some(browser),
            extractor: self.extractor,
            throttle: self.throttle,
            writer: self.writer,
        }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Fetches and extracts `url` with the shop's retry policy. Every attempt
    /// waits for the shop's rate-limit slot first.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::BrowserUnavailable`] for a JavaScript shop when
    /// no browser backend is configured, the last transient fetch error once
    /// retries are exhausted, or the first permanent error.
    pub async fn capture(&self, shop: &ShopConfig, url: &str) -> Result<RawCapture, ScraperError> {
        if shop.requires_js && self.browser.is_none() {
            return Err(ScraperError::BrowserUnavailable {
                shop_id: shop.id.clone(),
            });
        }
        let interval = Duration::from_millis(shop.rate_limit_ms);

        retry_with_backoff(
            shop.effective_retry_limit(),
            shop.effective_retry_backoff_ms(),
            || async move {
                self.throttle.acquire(&shop.id, interval).await;
                let page = match (&self.browser, shop.requires_js) {
                    (Some(browser), true) => browser.fetch_page(url).await?,
                    _ => self.fetcher.fetch_page(url).await?,
                };
                Ok(self.extractor.extract(&page, shop)?)
            },
        )
        .await
    }

    /// Captures `url` and upserts the result into the raw store, which
    /// re-queues it for resolution.
    ///
    /// # Errors
    ///
    /// Returns any error from [`Self::capture`], or [`ScraperError::Store`]
    /// when the save fails.
    pub async fn capture_and_save(
        &self,
        shop: &ShopConfig,
        url: &str,
    ) -> Result<RawCapture, ScraperError> {
        let capture = self.capture(shop, url).await?;
        self.writer.save_raw_capture(&capture).await?;
        tracing::info!(
            shop_id = %capture.shop_id,
            external_id = %capture.external_id,
            price = %capture.price,
            currency = %capture.currency,
            "saved raw capture"
        );
        Ok(capture)
    }

    /// Captures each URL in turn. Failures are logged and counted; they do
    /// not stop the run.
    pub async fn capture_all(&self, shop: &ShopConfig, urls: &[String]) -> CaptureSummary {
        let mut summary = CaptureSummary::default();
        for url in urls {
            match self.capture_and_save(shop, url).await {
                Ok(_) => summary.saved += 1,
                Err(e) => {
                    tracing::error!(shop_id = %shop.id, url = %url, error = %e, "capture failed");
                    summary.failed += 1;
                }
            }
        }
        if summary.failed > 0 {
            tracing::warn!(
                shop_id = %shop.id,
                failed = summary.failed,
                total = urls.len(),
                "some pages failed to capture"
            );
        }
        summary
    }
}
