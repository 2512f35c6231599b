// Login screen

use super::{BasePage, page_url};
use crate::credentials::Credentials;
use crate::error::Result;
use crate::locator::Target;
use playwright_rs::{Locator, Page};
use std::time::Duration;

/// The storefront's landing page with the login form
pub struct LoginPage {
    base: BasePage,
    base_url: String,
}

impl LoginPage {
    pub fn new(page: Page, base_url: impl Into<String>) -> Self {
        Self {
            base: BasePage::new(page),
            base_url: base_url.into(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.base = self.base.with_timeout(timeout);
        self
    }

    pub fn username_input() -> Target {
        Target::css("input#user-name")
    }

    pub fn password_input() -> Target {
        Target::css("input#password")
    }

    pub fn login_button() -> Target {
        Target::css("input#login-button")
    }

    pub fn error_message() -> Target {
        Target::css("h3[data-test='error']")
    }

    pub async fn error_banner(&self) -> Locator {
        self.base.locate(&Self::error_message()).await
    }

    pub async fn goto(&self) -> Result<()> {
        self.base.goto(&page_url(&self.base_url, "")?).await
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<()> {
        tracing::debug!(username = credentials.username(), "Logging in");
        self.base
            .fill(&Self::username_input(), credentials.username())
            .await?;
        self.base
            .fill(&Self::password_input(), credentials.password())
            .await?;
        self.base.click(&Self::login_button()).await
    }

    /// Text of the error banner, once it is shown.
    pub async fn error_text(&self) -> Result<Option<String>> {
        self.base.expect_visible(&Self::error_message()).await?;
        self.base.text(&Self::error_message()).await
    }

    pub fn base(&self) -> &BasePage {
        &self.base
    }
}
