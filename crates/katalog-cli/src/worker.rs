//! Wires the Postgres catalog into the capture runner and the ingestion
//! orchestrator, and runs one pass of each job.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

use katalog_core::{AppConfig, CatalogReader, ShopConfig};
use katalog_db::PgCatalog;
use katalog_ingest::{BatchReport, IngestError, IngestionOrchestrator};
use katalog_matching::{EntityResolver, MatchThresholds, SimilarityScorer};
use katalog_scraper::{CaptureRunner, CaptureSummary, FieldExtractor, PriceParser, StaticFetcher};

type Orchestrator = IngestionOrchestrator<PgCatalog, PgCatalog, PgCatalog, PgCatalog, PgCatalog>;

#[cfg(feature = "chromium")]
type Runner = CaptureRunner<
    PgCatalog,
    katalog_scraper::BrowserRenderer<katalog_scraper::ChromiumLauncher>,
>;
#[cfg(not(feature = "chromium"))]
type Runner = CaptureRunner<PgCatalog>;

pub(crate) struct Worker {
    config: AppConfig,
    shops: Vec<ShopConfig>,
    catalog: PgCatalog,
    orchestrator: Orchestrator,
    runner: Runner,
    // One batch and one rescrape pass at a time.
    process_slot: JobSlot,
    rescrape_slot: JobSlot,
}

/// Admits one run of a job at a time and lets shutdown wait for it.
#[derive(Debug, Default)]
pub(crate) struct JobSlot {
    running: Mutex<()>,
}

impl JobSlot {
    /// `None` while a run is in progress or once `cancel` has fired.
    pub(crate) fn try_begin(&self, cancel: &CancellationToken) -> Option<MutexGuard<'_, ()>> {
        if cancel.is_cancelled() {
            return None;
        }
        let guard = self.running.try_lock().ok()?;
        // Shutdown may have started between the check and the lock.
        if cancel.is_cancelled() {
            return None;
        }
        Some(guard)
    }

    /// Resolves once no run holds the slot.
    pub(crate) async fn drain(&self) {
        drop(self.running.lock().await);
    }
}

impl Worker {
    pub(crate) fn new(
        config: AppConfig,
        pool: PgPool,
        shops: Vec<ShopConfig>,
    ) -> anyhow::Result<Self> {
        let catalog = PgCatalog::new(pool);

        let thresholds =
            MatchThresholds::new(config.match_exact_threshold, config.match_probable_threshold)?;
        let resolver = EntityResolver::new(catalog.clone(), SimilarityScorer::default(), thresholds);
        let orchestrator = IngestionOrchestrator::new(
            catalog.clone(),
            resolver,
            catalog.clone(),
            catalog.clone(),
            catalog.clone(),
        );

        let runner = build_runner(&config, catalog.clone())?;

        Ok(Self {
            config,
            shops,
            catalog,
            orchestrator,
            runner,
            process_slot: JobSlot::default(),
            rescrape_slot: JobSlot::default(),
        })
    }

    pub(crate) fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Waits for a running batch and a running rescrape pass to finish.
    /// Call after cancelling so no new run can start.
    pub(crate) async fn drain(&self) {
        self.process_slot.drain().await;
        self.rescrape_slot.drain().await;
    }

    /// Runs one batch. A cancelled or skipped batch is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error when the batch cannot be loaded.
    pub(crate) async fn process(
        &self,
        batch_size: Option<i64>,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Option<BatchReport>> {
        let Some(_running) = self.process_slot.try_begin(cancel) else {
            tracing::debug!("batch already running or shutting down; skipping");
            return Ok(None);
        };
        let max_size = batch_size.unwrap_or_else(|| configured_batch_size(&self.config));

        match self.orchestrator.run_batch(max_size, cancel).await {
            Ok(report) => Ok(Some(report)),
            Err(IngestError::Cancelled { processed }) => {
                tracing::info!(processed, "batch stopped by shutdown");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Captures one page of `shop_id` and saves it to the raw store.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown or disabled shop, or when the capture
    /// fails after retries.
    pub(crate) async fn scrape(&self, shop_id: &str, url: &str) -> anyhow::Result<()> {
        let shop = find_shop(&self.shops, shop_id)
            .ok_or_else(|| anyhow::anyhow!("shop '{shop_id}' not found in shops file"))?;
        if !shop.enabled {
            anyhow::bail!("shop '{shop_id}' is disabled");
        }
        self.runner.capture_and_save(shop, url).await?;
        Ok(())
    }

    /// Re-captures the stalest price pages, up to the configured limit.
    ///
    /// Pages of unknown or disabled shops are skipped. Stops early when
    /// `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns an error when the stale list cannot be loaded.
    pub(crate) async fn rescrape(
        &self,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Option<CaptureSummary>> {
        let Some(_running) = self.rescrape_slot.try_begin(cancel) else {
            tracing::debug!("rescrape already running or shutting down; skipping");
            return Ok(None);
        };

        let cutoff = stale_cutoff(Utc::now(), self.config.rescrape_after_hours);
        let stale = self
            .catalog
            .list_stale_price_urls(cutoff, self.config.rescrape_limit)
            .await?;
        if stale.is_empty() {
            tracing::debug!(%cutoff, "no stale prices");
            return Ok(Some(CaptureSummary::default()));
        }

        let mut summary = CaptureSummary::default();
        for item in &stale {
            if cancel.is_cancelled() {
                tracing::info!(saved = summary.saved, "rescrape stopped by shutdown");
                break;
            }
            let Some(shop) = find_shop(&self.shops, &item.shop_id).filter(|s| s.enabled) else {
                tracing::warn!(
                    shop_id = %item.shop_id,
                    url = %item.url,
                    "skipping stale price of unknown or disabled shop"
                );
                continue;
            };
            match self.runner.capture_and_save(shop, &item.url).await {
                Ok(_) => summary.saved += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!(
                        shop_id = %item.shop_id,
                        url = %item.url,
                        error = %e,
                        "rescrape failed"
                    );
                }
            }
        }

        if summary.failed > 0 {
            tracing::warn!(
                saved = summary.saved,
                failed = summary.failed,
                stale = stale.len(),
                "rescrape finished with failures"
            );
        } else {
            tracing::info!(saved = summary.saved, stale = stale.len(), "rescrape finished");
        }
        Ok(Some(summary))
    }
}

#[cfg(feature = "chromium")]
fn build_runner(config: &AppConfig, catalog: PgCatalog) -> anyhow::Result<Runner> {
    use katalog_scraper::{BrowserRenderer, ChromiumLauncher, RenderTimings};

    let timings = RenderTimings {
        budget: std::time::Duration::from_secs(config.browser_timeout_secs),
        ..RenderTimings::default()
    };
    let browser = BrowserRenderer::new(ChromiumLauncher::new(&config.user_agent), timings);
    Ok(static_runner(config, catalog)?.with_browser(browser))
}

#[cfg(not(feature = "chromium"))]
fn build_runner(config: &AppConfig, catalog: PgCatalog) -> anyhow::Result<Runner> {
    static_runner(config, catalog)
}

fn static_runner(
    config: &AppConfig,
    catalog: PgCatalog,
) -> anyhow::Result<CaptureRunner<PgCatalog>> {
    let fetcher = StaticFetcher::new(config.fetch_timeout_secs, &config.user_agent)?;
    let extractor = FieldExtractor::new(PriceParser::new(&config.home_currency));
    Ok(CaptureRunner::new(fetcher, extractor, catalog))
}

pub(crate) fn configured_batch_size(config: &AppConfig) -> i64 {
    i64::try_from(config.batch_size).unwrap_or(i64::MAX)
}

pub(crate) fn find_shop<'a>(shops: &'a [ShopConfig], shop_id: &str) -> Option<&'a ShopConfig> {
    shops.iter().find(|s| s.id.eq_ignore_ascii_case(shop_id))
}

pub(crate) fn stale_cutoff(now: DateTime<Utc>, after_hours: u32) -> DateTime<Utc> {
    now - Duration::hours(i64::from(after_hours))
}
