use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::app::{CrosstableError, Result};
use crate::scraper::config::ScraperConfig;
use crate::scraper::PageSource;

/// A headless Chrome instance with a single tab, owned for one scrape run.
///
/// Call [`BrowserSession::close`] when done. If the session is dropped
/// without closing (early return, panic), the event handler is aborted and
/// chromiumoxide kills the child process.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    poll_interval: Duration,
}

impl BrowserSession {
    /// Launch the browser. Fails fast with [`CrosstableError::Setup`] when
    /// no usable Chrome/Chromium can be started.
    pub async fn launch(config: &ScraperConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer")
            .request_timeout(config.player_page_timeout());

        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(ref path) = config.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        let browser_config = builder
            .build()
            .map_err(|e| CrosstableError::Setup(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            CrosstableError::Setup(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser event error: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| CrosstableError::Setup(format!("Failed to create page: {}", e)))?;

        if let Some(ref ua) = config.user_agent {
            page.set_user_agent(ua)
                .await
                .map_err(|e| CrosstableError::Setup(format!("Failed to set user agent: {}", e)))?;
        }

        debug!(headless = config.headless, "browser launched");

        Ok(Self {
            browser,
            page,
            handler,
            poll_interval: config.selector_poll_interval(),
        })
    }

    /// Close the browser and wait for the process to exit.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Failed to wait for browser exit: {}", e);
        }
        self.handler.abort();
        debug!("browser closed");
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait]
impl PageSource for BrowserSession {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
        let navigation = async {
            self.page
                .goto(url)
                .await
                .map_err(|e| CrosstableError::navigation(url, e))?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| CrosstableError::navigation(url, e))?;
            Ok(())
        };

        match tokio::time::timeout(timeout, navigation).await {
            Ok(result) => result,
            Err(_) => Err(CrosstableError::navigation(
                url,
                format!("no load event within {:?}", timeout),
            )),
        }
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(CrosstableError::Timeout(format!(
                    "selector {} did not appear within {:?}",
                    selector, timeout
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn html(&self) -> Result<String> {
        self.page
            .content()
            .await
            .map_err(|e| CrosstableError::Parse(format!("Failed to read page content: {}", e)))
    }
}
