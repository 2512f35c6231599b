//! storefront-e2e: end-to-end UI suite for the Sauce Demo storefront
//!
//! Built on `playwright-rs`. The crate provides:
//!
//! - a session fixture that launches one browser per worker ([`Session`]),
//! - a per-test context fixture with video/trace recording and artifact
//!   retention ([`TestContext`]),
//! - page objects for the login, inventory, cart and checkout screens
//!   ([`pages`]),
//! - a sequential scenario runner ([`Suite`]).
//!
//! # Example
//!
//! ```ignore
//! use storefront_e2e::pages::{InventoryPage, LoginPage};
//! use storefront_e2e::{Credentials, Settings, Suite};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::from_env();
//!     let credentials = Credentials::from_env()?;
//!
//!     let summary = Suite::new(settings, credentials)
//!         .case("standard_user_can_login", |case| async move {
//!             let login = LoginPage::new(case.page.clone(), &case.settings.base_url);
//!             login.goto().await?;
//!             login.login(&case.credentials).await?;
//!             InventoryPage::new(case.page).expect_displayed().await
//!         })
//!         .run()
//!         .await?;
//!
//!     assert!(summary.success());
//!     Ok(())
//! }
//! ```
//!
//! Artifacts land in `<dir>/<worker>/<attempt>/`; see [`artifacts`] for the
//! layout and the retention rules.

pub mod artifacts;
pub mod cleanup;
pub mod config;
pub mod context;
pub mod credentials;
mod error;
pub mod locator;
pub mod logging;
pub mod pages;
pub mod report;
pub mod session;
pub mod suite;
pub mod trace;

pub use artifacts::{ArtifactKind, ArtifactLayout, ArtifactRecord, Fate, Outcome, RetentionPolicy};
pub use config::Settings;
pub use context::{TeardownReport, TestContext};
pub use credentials::Credentials;
pub use error::{CleanupError, Error, Result};
pub use locator::Target;
pub use session::{BrowserKind, Session};
pub use suite::{Case, CaseResult, Suite, SuiteSummary};
