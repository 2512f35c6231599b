// Session fixture - one browser process per worker
//
// The browser is launched once and shared, read-only, by every test in the
// worker. Tests get isolation from per-test contexts (see `context`), not
// from separate browsers.

use crate::artifacts::{ArtifactLayout, RetentionPolicy, SlugAllocator};
use crate::config::Settings;
use crate::context::TestContext;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use playwright_rs::{Browser, LaunchOptions, Playwright};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Browser engines Playwright can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserKind {
    Chromium,
    Firefox,
    Webkit,
}

impl FromStr for BrowserKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chromium" => Ok(BrowserKind::Chromium),
            "firefox" => Ok(BrowserKind::Firefox),
            "webkit" => Ok(BrowserKind::Webkit),
            other => Err(Error::UnsupportedBrowser(other.to_string())),
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BrowserKind::Chromium => "chromium",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Webkit => "webkit",
        })
    }
}

/// Builds launch options from the suite settings.
pub fn launch_options(settings: &Settings) -> LaunchOptions {
    let mut options = LaunchOptions::new().headless(!settings.headed);
    if settings.slow_mo_ms > 0 {
        options = options.slow_mo(settings.slow_mo_ms as f64);
    }
    options
}

/// Session-scoped browser shared by the tests of one worker
pub struct Session {
    playwright: Playwright,
    browser: Mutex<Option<Browser>>,
    kind: BrowserKind,
    settings: Arc<Settings>,
    layout: ArtifactLayout,
    slugs: SlugAllocator,
}

impl Session {
    /// Starts the Playwright driver and launches the configured browser.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedBrowser`] for an unknown engine name
    /// - [`Error::BrowserLaunch`] when the driver or the browser fails to start
    ///
    /// Both are fatal for the session.
    pub async fn launch(settings: Arc<Settings>) -> Result<Self> {
        let kind: BrowserKind = settings.browser.parse()?;

        tracing::info!(
            browser = %kind,
            headed = settings.headed,
            slow_mo_ms = settings.slow_mo_ms,
            worker = %settings.worker_id,
            attempt = %settings.attempt_id,
            "Launching browser session"
        );

        let playwright = Playwright::launch()
            .await
            .map_err(|source| Error::BrowserLaunch {
                browser: "playwright driver".to_string(),
                source,
            })?;

        let browser_type = match kind {
            BrowserKind::Chromium => playwright.chromium(),
            BrowserKind::Firefox => playwright.firefox(),
            BrowserKind::Webkit => playwright.webkit(),
        };

        let browser = match browser_type.launch_with_options(launch_options(&settings)).await {
            Ok(browser) => browser,
            Err(source) => {
                if let Err(e) = playwright.shutdown().await {
                    tracing::warn!(error = %e, "Failed to shut down driver after launch failure");
                }
                return Err(Error::BrowserLaunch {
                    browser: kind.to_string(),
                    source,
                });
            }
        };

        tracing::debug!(version = browser.version(), "Browser launched");

        Ok(Self {
            playwright,
            browser: Mutex::new(Some(browser)),
            kind,
            layout: ArtifactLayout::from_settings(&settings),
            slugs: SlugAllocator::new(),
            settings,
        })
    }

    pub fn kind(&self) -> BrowserKind {
        self.kind
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    /// Reserves a unique artifact slug for a test name.
    pub fn artifact_slug(&self, name: &str) -> String {
        self.slugs.allocate(name)
    }

    pub fn retention(&self) -> RetentionPolicy {
        RetentionPolicy {
            keep_all: self.settings.keep_artifacts,
        }
    }

    /// Returns the shared browser handle, or `TargetClosed` after `close`.
    pub fn browser(&self) -> Result<Browser> {
        self.browser.lock().clone().ok_or_else(|| {
            Error::Playwright(playwright_rs::Error::TargetClosed {
                target_type: "Browser".to_string(),
                context: "session already closed".to_string(),
            })
        })
    }

    pub fn is_open(&self) -> bool {
        self.browser.lock().is_some()
    }

    /// Opens an isolated context for one test.
    pub async fn new_test(&self, name: &str) -> Result<TestContext> {
        TestContext::open(self, name).await
    }

    /// Releases the browser and the driver.
    ///
    /// Safe to call more than once; only the first call closes anything.
    /// Release errors are logged and suppressed.
    pub async fn close(&self) {
        let Some(browser) = self.browser.lock().take() else {
            return;
        };

        if let Err(e) = browser.close().await {
            tracing::warn!(error = %e, "Failed to close browser");
        }
        if let Err(e) = self.playwright.shutdown().await {
            tracing::warn!(error = %e, "Failed to shut down Playwright driver");
        }
        tracing::info!(browser = %self.kind, "Browser session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_kind_parsing() {
        assert_eq!("chromium".parse::<BrowserKind>().unwrap(), BrowserKind::Chromium);
        assert_eq!(" Firefox ".parse::<BrowserKind>().unwrap(), BrowserKind::Firefox);
        assert_eq!("WEBKIT".parse::<BrowserKind>().unwrap(), BrowserKind::Webkit);
    }

    #[test]
    fn test_unknown_browser_is_rejected() {
        let err = "edge".parse::<BrowserKind>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedBrowser(ref name) if name == "edge"));
        assert!(err.is_setup());
    }

    #[test]
    fn test_launch_options_follow_settings() {
        let settings = Settings {
            headed: false,
            slow_mo_ms: 50,
            ..Settings::default()
        };
        let options = launch_options(&settings);
        assert_eq!(options.headless, Some(true));
        assert_eq!(options.slow_mo, Some(50.0));

        let headed = launch_options(&Settings::default());
        assert_eq!(headed.headless, Some(false));
        assert_eq!(headed.slow_mo, None);
    }
}
