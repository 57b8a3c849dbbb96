use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::app::{CrosstableError, Result};
use crate::scraper::PageSource;

/// Serves recorded HTML by URL instead of driving a browser.
///
/// URLs without a recorded page fail to load, which is how tests model a
/// tournament page that never arrives.
#[derive(Debug, Default)]
pub struct FixtureSource {
    pages: HashMap<String, String>,
    current: Mutex<Option<String>>,
    visits: Mutex<Vec<String>>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    /// URLs passed to `goto`, in order, including ones that failed.
    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().map(|v| v.clone()).unwrap_or_default()
    }

    fn current(&self) -> Result<String> {
        self.current
            .lock()
            .map_err(|_| CrosstableError::Parse("fixture state poisoned".into()))?
            .clone()
            .ok_or_else(|| CrosstableError::Parse("no page loaded".into()))
    }
}

#[async_trait]
impl PageSource for FixtureSource {
    async fn goto(&self, url: &str, _timeout: Duration) -> Result<()> {
        if let Ok(mut visits) = self.visits.lock() {
            visits.push(url.to_string());
        }

        let html = self
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| CrosstableError::navigation(url, "no recorded page"))?;

        *self
            .current
            .lock()
            .map_err(|_| CrosstableError::Parse("fixture state poisoned".into()))? = Some(html);
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, _timeout: Duration) -> Result<()> {
        let css = Selector::parse(selector)
            .map_err(|e| CrosstableError::Parse(format!("bad selector {}: {}", selector, e)))?;
        let found = Html::parse_document(&self.current()?).select(&css).next().is_some();

        if found {
            Ok(())
        } else {
            Err(CrosstableError::Timeout(format!("selector {} not present", selector)))
        }
    }

    async fn html(&self) -> Result<String> {
        self.current()
    }
}
