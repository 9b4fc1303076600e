//! Chromium launcher for the browser backend, driven over CDP.

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use super::browser::{BrowserLauncher, BrowserSession};
use crate::error::ScraperError;

#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    user_agent: String,
}

impl ChromiumLauncher {
    #[must_use]
    pub fn new(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_owned(),
        }
    }
}

fn browser_error(url: &str, reason: impl std::fmt::Display) -> ScraperError {
    ScraperError::Browser {
        url: url.to_owned(),
        reason: reason.to_string(),
    }
}

impl BrowserLauncher for ChromiumLauncher {
    type Session = ChromiumSession;

    async fn launch(&self) -> Result<ChromiumSession, ScraperError> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .arg(format!("--user-agent={}", self.user_agent))
            .build()
            .map_err(|reason| browser_error("about:blank", reason))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| browser_error("about:blank", e))?;

        // The CDP connection only makes progress while the handler is polled.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(ChromiumSession {
            browser,
            page: None,
            handler,
        })
    }
}

pub struct ChromiumSession {
    browser: Browser,
    page: Option<Page>,
    handler: JoinHandle<()>,
}

impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<(), ScraperError> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| browser_error(url, e))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| browser_error(url, e))?;
        self.page = Some(page);
        Ok(())
    }

    async fn content(&mut self) -> Result<String, ScraperError> {
        let Some(page) = self.page.as_ref() else {
            return Err(browser_error("about:blank", "no page open"));
        };
        page.content()
            .await
            .map_err(|e| browser_error("about:blank", e))
    }

    async fn close(mut self) -> Result<(), ScraperError> {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                tracing::debug!(error = %e, "page close failed, closing browser anyway");
            }
        }
        let closed = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            tracing::debug!(error = %e, "browser process did not exit cleanly");
        }
        self.handler.abort();
        closed
            .map(|_| ())
            .map_err(|e| browser_error("about:blank", e))
    }
}
