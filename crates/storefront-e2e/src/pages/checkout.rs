// Checkout screens: customer information, overview, completion

use super::BasePage;
use crate::error::{Error, Result};
use crate::locator::Target;
use playwright_rs::Page;
use std::time::Duration;

/// Customer details entered on the first checkout step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerInfo {
    first_name: String,
    last_name: String,
    postal_code: String,
}

impl CustomerInfo {
    /// # Errors
    ///
    /// Returns [`Error::InvalidCustomerInfo`] when any field is blank.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        postal_code: impl Into<String>,
    ) -> Result<Self> {
        let info = Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            postal_code: postal_code.into(),
        };
        for (field, value) in [
            ("first_name", &info.first_name),
            ("last_name", &info.last_name),
            ("postal_code", &info.postal_code),
        ] {
            if value.trim().is_empty() {
                return Err(Error::InvalidCustomerInfo { field });
            }
        }
        Ok(info)
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn postal_code(&self) -> &str {
        &self.postal_code
    }
}

/// Step one: "Your Information"
pub struct CheckoutInformationPage {
    base: BasePage,
}

impl CheckoutInformationPage {
    pub fn new(page: Page) -> Self {
        Self {
            base: BasePage::new(page),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.base = self.base.with_timeout(timeout);
        self
    }

    pub fn first_name_input() -> Target {
        Target::css("input#first-name")
    }

    pub fn last_name_input() -> Target {
        Target::css("input#last-name")
    }

    pub fn postal_code_input() -> Target {
        Target::css("input#postal-code")
    }

    pub fn continue_button() -> Target {
        Target::css("input[data-test=\"continue\"]")
    }

    pub async fn enter_customer_info(&self, info: &CustomerInfo) -> Result<()> {
        self.base
            .fill(&Self::first_name_input(), info.first_name())
            .await?;
        self.base
            .fill(&Self::last_name_input(), info.last_name())
            .await?;
        self.base
            .fill(&Self::postal_code_input(), info.postal_code())
            .await?;
        self.base.click(&Self::continue_button()).await
    }

    pub fn base(&self) -> &BasePage {
        &self.base
    }
}

/// Step two: order overview
pub struct CheckoutOverviewPage {
    base: BasePage,
}

impl CheckoutOverviewPage {
    pub fn new(page: Page) -> Self {
        Self {
            base: BasePage::new(page),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.base = self.base.with_timeout(timeout);
        self
    }

    pub fn finish_button() -> Target {
        Target::css("button[data-test=\"finish\"]")
    }

    pub async fn finish(&self) -> Result<()> {
        self.base.click(&Self::finish_button()).await
    }

    pub fn base(&self) -> &BasePage {
        &self.base
    }
}

/// Order confirmation
pub struct CheckoutCompletePage {
    base: BasePage,
}

impl CheckoutCompletePage {
    pub fn new(page: Page) -> Self {
        Self {
            base: BasePage::new(page),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.base = self.base.with_timeout(timeout);
        self
    }

    pub fn complete_header() -> Target {
        Target::css(".complete-header")
    }

    pub fn back_home_button() -> Target {
        Target::role_named("button", "Back Home").exact()
    }

    pub async fn is_complete(&self) -> bool {
        self.base.is_visible(&Self::complete_header()).await
    }

    pub async fn expect_complete(&self) -> Result<()> {
        self.base.expect_visible(&Self::complete_header()).await
    }

    pub async fn back_home(&self) -> Result<()> {
        self.base.click(&Self::back_home_button()).await
    }

    pub fn base(&self) -> &BasePage {
        &self.base
    }
}
