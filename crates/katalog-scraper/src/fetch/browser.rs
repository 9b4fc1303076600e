//! Headless-browser backend with a hard wall-clock budget.
//!
//! The renderer owns one browser session per page. The session is wrapped
//! in a [`SessionGuard`] so it is torn down on every exit path: success,
//! navigation errors, budget expiry, and the caller dropping the future.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;

use super::PageSource;
use crate::error::ScraperError;
use crate::extract::PageContent;

/// One live browser process plus at most one page.
pub trait BrowserSession: Send + 'static {
    fn navigate(&mut self, url: &str) -> impl Future<Output = Result<(), ScraperError>> + Send;

    /// Serialized DOM of the current page.
    fn content(&mut self) -> impl Future<Output = Result<String, ScraperError>> + Send;

    fn close(self) -> impl Future<Output = Result<(), ScraperError>> + Send;
}

pub trait BrowserLauncher: Send + Sync {
    type Session: BrowserSession;

    fn launch(&self) -> impl Future<Output = Result<Self::Session, ScraperError>> + Send;
}

#[derive(Debug, Clone, Copy)]
pub struct RenderTimings {
    /// Total budget for launch, navigation, settle, and content capture.
    pub budget: Duration,
    /// Pause after navigation so client-side scripts can fill in prices.
    pub settle: Duration,
    /// Upper bound on tearing a session down.
    pub close_timeout: Duration,
}

impl Default for RenderTimings {
    fn default() -> Self {
        Self {
            budget: Duration::from_secs(120),
            settle: Duration::from_secs(3),
            close_timeout: Duration::from_secs(5),
        }
    }
}

pub struct BrowserRenderer<L> {
    launcher: L,
    timings: RenderTimings,
}

impl<L: BrowserLauncher> BrowserRenderer<L> {
    #[must_use]
    pub fn new(launcher: L, timings: RenderTimings) -> Self {
        Self { launcher, timings }
    }

    async fn render(&self, url: &str) -> Result<String, ScraperError> {
        let session = self.launcher.launch().await?;
        let mut guard = SessionGuard::new(session, self.timings.close_timeout, url);

        let html = async {
            guard.navigate(url).await?;
            if !self.timings.settle.is_zero() {
                tokio::time::sleep(self.timings.settle).await;
            }
            guard.content().await
        }
        .await;

        guard.close().await;
        html
    }
}

impl<L: BrowserLauncher> PageSource for BrowserRenderer<L> {
    async fn fetch_page(&self, url: &str) -> Result<PageContent, ScraperError> {
        let budget = self.timings.budget;
        match tokio::time::timeout(budget, self.render(url)).await {
            Ok(Ok(html)) => Ok(PageContent {
                url: url.to_owned(),
                html,
                fetched_at: Utc::now(),
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                tracing::warn!(url, budget_secs = budget.as_secs(), "browser render exceeded budget");
                Err(ScraperError::BrowserTimeout {
                    url: url.to_owned(),
                    budget_secs: budget.as_secs(),
                })
            }
        }
    }
}

/// Owns a session until it is closed explicitly or dropped.
///
/// Dropping an open guard spawns a bounded close on the runtime captured at
/// construction.
struct SessionGuard<S: BrowserSession> {
    session: Option<S>,
    close_timeout: Duration,
    url: String,
    runtime: Option<tokio::runtime::Handle>,
}

impl<S: BrowserSession> SessionGuard<S> {
    fn new(session: S, close_timeout: Duration, url: &str) -> Self {
        Self {
            session: Some(session),
            close_timeout,
            url: url.to_owned(),
            runtime: tokio::runtime::Handle::try_current().ok(),
        }
    }

    fn closed_error(&self) -> ScraperError {
        ScraperError::Browser {
            url: self.url.clone(),
            reason: "session already closed".to_string(),
        }
    }

    async fn navigate(&mut self, url: &str) -> Result<(), ScraperError> {
        match self.session.as_mut() {
            Some(session) => session.navigate(url).await,
            None => Err(self.closed_error()),
        }
    }

    async fn content(&mut self) -> Result<String, ScraperError> {
        match self.session.as_mut() {
            Some(session) => session.content().await,
            None => Err(self.closed_error()),
        }
    }

    /// Closes the session within the close timeout. Failures are logged:
    /// the page result is already decided at this point.
    async fn close(mut self) {
        if let Some(session) = self.session.take() {
            close_bounded(session, self.close_timeout, &self.url).await;
        }
    }
}

impl<S: BrowserSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let url = std::mem::take(&mut self.url);
        let close_timeout = self.close_timeout;
        match &self.runtime {
            Some(runtime) => {
                runtime.spawn(async move {
                    close_bounded(session, close_timeout, &url).await;
                });
            }
            None => tracing::warn!(url, "no runtime to close abandoned browser session"),
        }
    }
}

async fn close_bounded<S: BrowserSession>(session: S, close_timeout: Duration, url: &str) {
    match tokio::time::timeout(close_timeout, session.close()).await {
        Ok(Ok(())) => tracing::debug!(url, "browser session closed"),
        Ok(Err(e)) => tracing::warn!(url, error = %e, "failed to close browser session"),
        Err(_) => tracing::warn!(
            url,
            close_timeout_secs = close_timeout.as_secs(),
            "timed out closing browser session"
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[derive(Clone, Copy)]
    enum Behaviour {
        Render,
        FailNavigate,
        HangOnContent,
    }

    #[derive(Clone)]
    struct FakeLauncher {
        behaviour: Behaviour,
        launched: Arc<AtomicUsize>,
        closed: Arc<AtomicUsize>,
    }

    struct FakeSession {
        behaviour: Behaviour,
        closed: Arc<AtomicUsize>,
    }

    impl FakeLauncher {
        fn new(behaviour: Behaviour) -> Self {
            Self {
                behaviour,
                launched: Arc::new(AtomicUsize::new(0)),
                closed: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl BrowserLauncher for FakeLauncher {
        type Session = FakeSession;

        async fn launch(&self) -> Result<FakeSession, ScraperError> {
            self.launched.fetch_add(1, Ordering::SeqCst);
            Ok(FakeSession {
                behaviour: self.behaviour,
                closed: Arc::clone(&self.closed),
            })
        }
    }

    impl BrowserSession for FakeSession {
        async fn navigate(&mut self, url: &str) -> Result<(), ScraperError> {
            match self.behaviour {
                Behaviour::FailNavigate => Err(ScraperError::Browser {
                    url: url.to_owned(),
                    reason: "net::ERR_NAME_NOT_RESOLVED".to_owned(),
                }),
                _ => Ok(()),
            }
        }

        async fn content(&mut self) -> Result<String, ScraperError> {
            if matches!(self.behaviour, Behaviour::HangOnContent) {
                std::future::pending::<()>().await;
            }
            Ok("<html><body><h1>Rendered</h1></body></html>".to_owned())
        }

        async fn close(self) -> Result<(), ScraperError> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn timings(budget_ms: u64) -> RenderTimings {
        RenderTimings {
            budget: Duration::from_millis(budget_ms),
            settle: Duration::ZERO,
            close_timeout: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn renders_and_closes_session() {
        let launcher = FakeLauncher::new(Behaviour::Render);
        let renderer = BrowserRenderer::new(launcher.clone(), timings(1_000));
        let page = renderer
            .fetch_page("https://shop.example/p/1")
            .await
            .unwrap();
        assert!(page.html.contains("Rendered"));
        assert_eq!(page.url, "https://shop.example/p/1");
        assert_eq!(launcher.launched.load(Ordering::SeqCst), 1);
        assert_eq!(launcher.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn navigation_failure_still_closes_session() {
        let launcher = FakeLauncher::new(Behaviour::FailNavigate);
        let renderer = BrowserRenderer::new(launcher.clone(), timings(1_000));
        let err = renderer
            .fetch_page("https://shop.example/p/1")
            .await
            .unwrap_err();
        assert!(matches!(err, ScraperError::Browser { .. }));
        assert_eq!(launcher.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn budget_expiry_fails_and_tears_down_session() {
        let launcher = FakeLauncher::new(Behaviour::HangOnContent);
        let renderer = BrowserRenderer::new(launcher.clone(), timings(50));
        let err = renderer
            .fetch_page("https://shop.example/p/1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ScraperError::BrowserTimeout { budget_secs: 0, .. }
        ));

        // The guard's drop hands the close to the runtime.
        for _ in 0..50 {
            if launcher.closed.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(launcher.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dropping_the_fetch_future_tears_down_session() {
        let launcher = FakeLauncher::new(Behaviour::HangOnContent);
        let renderer = BrowserRenderer::new(launcher.clone(), timings(60_000));
        let fetch = renderer.fetch_page("https://shop.example/p/1");
        let outcome = tokio::time::timeout(Duration::from_millis(50), fetch).await;
        assert!(outcome.is_err());

        for _ in 0..50 {
            if launcher.closed.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(launcher.closed.load(Ordering::SeqCst), 1);
    }
}
