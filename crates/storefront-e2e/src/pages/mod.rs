// Page objects - one type per storefront screen
//
// Every screen wraps a `BasePage`, which owns the page handle and the action
// timeout. Element accessors return `Target`s or resolved `Locator`s; action
// methods combine locate, wait-for-visible, assert-enabled and click/fill.

mod cart;
mod checkout;
mod inventory;
mod login;

pub use cart::CartPage;
pub use checkout::{
    CheckoutCompletePage, CheckoutInformationPage, CheckoutOverviewPage, CustomerInfo,
};
pub use inventory::{BACKPACK, InventoryPage};
pub use login::LoginPage;

use crate::config::DEFAULT_ACTION_TIMEOUT_MS;
use crate::error::{Error, Result};
use crate::locator::Target;
use playwright_rs::{ClickOptions, FillOptions, Locator, Page, expect};
use regex::Regex;
use std::time::{Duration, Instant};

/// Interval between URL checks in `expect_url_*`
const URL_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Shared behaviour of all page objects
#[derive(Clone)]
pub struct BasePage {
    page: Page,
    timeout: Duration,
}

impl BasePage {
    pub fn new(page: Page) -> Self {
        Self {
            page,
            timeout: Duration::from_millis(DEFAULT_ACTION_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn timeout_ms(&self) -> f64 {
        self.timeout.as_millis() as f64
    }

    pub async fn locate(&self, target: &Target) -> Locator {
        target.resolve(&self.page).await
    }

    pub async fn goto(&self, url: &str) -> Result<()> {
        tracing::debug!(url, "Navigating");
        self.page.goto(url, None).await?;
        Ok(())
    }

    /// Waits for the target to be visible and enabled, then clicks it.
    ///
    /// A target that never reports visible is still given the enabled check
    /// and the click, which carry their own timeouts.
    pub async fn click(&self, target: &Target) -> Result<()> {
        let locator = self.locate(target).await;
        if let Err(e) = expect(locator.clone())
            .with_timeout(self.timeout)
            .to_be_visible()
            .await
        {
            tracing::debug!(%target, error = %e, "Click target not visible yet");
        }
        expect(locator.clone())
            .with_timeout(self.timeout)
            .to_be_enabled()
            .await?;

        let options = ClickOptions::builder().timeout(self.timeout_ms()).build();
        locator.click(Some(options)).await?;
        tracing::debug!(%target, "Clicked");
        Ok(())
    }

    /// Clicks without the visible/enabled waits or Playwright's
    /// actionability checks; the click still has the action timeout.
    pub async fn click_forced(&self, target: &Target) -> Result<()> {
        let options = ClickOptions::builder()
            .force(true)
            .timeout(self.timeout_ms())
            .build();
        self.locate(target).await.click(Some(options)).await?;
        tracing::debug!(%target, "Force-clicked");
        Ok(())
    }

    /// Waits for the target to be visible, then fills it with `text`.
    pub async fn fill(&self, target: &Target, text: &str) -> Result<()> {
        let locator = self.locate(target).await;
        expect(locator.clone())
            .with_timeout(self.timeout)
            .to_be_visible()
            .await?;

        let options = FillOptions::builder().timeout(self.timeout_ms()).build();
        locator.fill(text, Some(options)).await?;
        tracing::debug!(%target, "Filled");
        Ok(())
    }

    pub async fn text(&self, target: &Target) -> Result<Option<String>> {
        Ok(self.locate(target).await.text_content().await?)
    }

    /// Current visibility; lookup errors count as not visible.
    pub async fn is_visible(&self, target: &Target) -> bool {
        self.locate(target).await.is_visible().await.unwrap_or(false)
    }

    /// Asserts the target becomes visible within the timeout.
    pub async fn expect_visible(&self, target: &Target) -> Result<()> {
        expect(self.locate(target).await)
            .with_timeout(self.timeout)
            .to_be_visible()
            .await
            .map_err(|e| Error::Assertion(format!("{target} not visible: {e}")))
    }

    pub fn url(&self) -> String {
        self.page.url()
    }

    /// Waits until the page URL contains `fragment`.
    pub async fn expect_url_contains(&self, fragment: &str) -> Result<()> {
        self.wait_for_url(|url| url.contains(fragment), fragment).await
    }

    /// Waits until the page URL matches `pattern`.
    pub async fn expect_url_matches(&self, pattern: &Regex) -> Result<()> {
        self.wait_for_url(|url| pattern.is_match(url), pattern.as_str())
            .await
    }

    async fn wait_for_url<F>(&self, matches: F, expected: &str) -> Result<()>
    where
        F: Fn(&str) -> bool,
    {
        let start = Instant::now();
        loop {
            let url = self.page.url();
            if matches(&url) {
                return Ok(());
            }
            if start.elapsed() >= self.timeout {
                return Err(Error::Assertion(format!(
                    "URL '{url}' did not match '{expected}' within {}ms",
                    self.timeout.as_millis()
                )));
            }
            tokio::time::sleep(URL_POLL_INTERVAL).await;
        }
    }
}

/// Joins a page path onto the site base URL.
pub fn page_url(base_url: &str, path: &str) -> Result<String> {
    let base = url::Url::parse(base_url).map_err(|source| Error::InvalidUrl {
        url: base_url.to_string(),
        source,
    })?;
    base.join(path)
        .map(String::from)
        .map_err(|source| Error::InvalidUrl {
            url: path.to_string(),
            source,
        })
}
