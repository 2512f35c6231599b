// Cart screen

use super::BasePage;
use crate::error::Result;
use crate::locator::Target;
use playwright_rs::Page;
use std::time::Duration;

pub struct CartPage {
    base: BasePage,
}

impl CartPage {
    pub fn new(page: Page) -> Self {
        Self {
            base: BasePage::new(page),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.base = self.base.with_timeout(timeout);
        self
    }

    pub fn cart_item() -> Target {
        Target::css(".cart_item")
    }

    pub fn checkout_button() -> Target {
        Target::css("button[data-test=\"checkout\"]")
    }

    pub async fn item_count(&self) -> Result<usize> {
        Ok(self.base.locate(&Self::cart_item()).await.count().await?)
    }

    pub async fn has_items(&self) -> bool {
        self.item_count().await.is_ok_and(|n| n > 0)
    }

    pub async fn checkout(&self) -> Result<()> {
        self.base.click(&Self::checkout_button()).await
    }

    pub fn base(&self) -> &BasePage {
        &self.base
    }
}
