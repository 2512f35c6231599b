// Inventory (product list) screen

use super::BasePage;
use crate::error::{Error, Result};
use crate::locator::Target;
use playwright_rs::{Locator, Page};
use std::time::Duration;

/// Product id of the Sauce Labs Backpack, used by the checkout journey
pub const BACKPACK: &str = "sauce-labs-backpack";

pub struct InventoryPage {
    base: BasePage,
}

impl InventoryPage {
    pub fn new(page: Page) -> Self {
        Self {
            base: BasePage::new(page),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.base = self.base.with_timeout(timeout);
        self
    }

    pub fn inventory_list() -> Target {
        Target::css(".inventory_list")
    }

    /// "Add to cart" button of the product with the given id
    pub fn add_button(product: &str) -> Target {
        Target::css(format!("button[id=\"add-to-cart-{product}\"]"))
    }

    pub fn cart_link() -> Target {
        Target::css(".shopping_cart_link")
    }

    pub fn cart_badge() -> Target {
        Target::css(".shopping_cart_badge")
    }

    pub fn menu_button() -> Target {
        Target::role_named("button", "Open Menu").exact()
    }

    pub async fn product_add_button(&self, product: &str) -> Locator {
        self.base.locate(&Self::add_button(product)).await
    }

    pub async fn is_displayed(&self) -> bool {
        self.base.is_visible(&Self::inventory_list()).await
    }

    pub async fn expect_displayed(&self) -> Result<()> {
        self.base.expect_visible(&Self::inventory_list()).await
    }

    pub async fn add_product(&self, product: &str) -> Result<()> {
        self.base.click(&Self::add_button(product)).await
    }

    pub async fn open_cart(&self) -> Result<()> {
        self.base.click(&Self::cart_link()).await
    }

    /// Number shown on the cart badge; no badge means an empty cart.
    pub async fn cart_count(&self) -> Result<usize> {
        if !self.base.is_visible(&Self::cart_badge()).await {
            return Ok(0);
        }
        let text = self.base.text(&Self::cart_badge()).await?.unwrap_or_default();
        text.trim()
            .parse()
            .map_err(|_| Error::Assertion(format!("cart badge shows '{text}', not a number")))
    }

    pub fn base(&self) -> &BasePage {
        &self.base
    }
}
