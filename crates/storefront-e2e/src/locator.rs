// Element targets for page objects
//
// A page object names its elements as `Target`s; they are turned into
// Playwright locators lazily, at action time.

use playwright_rs::{Locator, Page};
use std::fmt;

/// How a page object refers to an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Selector string (CSS by default, engine-prefixed strings like
    /// `text=Login` are passed through)
    Css(String),
    /// ARIA role lookup, optionally filtered by accessible name
    Role {
        role: String,
        name: Option<String>,
        /// Match the name case-sensitively and in full
        exact: bool,
    },
}

impl Target {
    pub fn css(selector: impl Into<String>) -> Self {
        Target::Css(selector.into())
    }

    pub fn role(role: impl Into<String>) -> Self {
        Target::Role {
            role: role.into(),
            name: None,
            exact: false,
        }
    }

    /// Role lookup with an accessible name (substring, case-insensitive)
    pub fn role_named(role: impl Into<String>, name: impl Into<String>) -> Self {
        Target::Role {
            role: role.into(),
            name: Some(name.into()),
            exact: false,
        }
    }

    /// Makes a role lookup match its name exactly; no effect on CSS targets.
    pub fn exact(self) -> Self {
        match self {
            Target::Role { role, name, .. } => Target::Role {
                role,
                name,
                exact: true,
            },
            css => css,
        }
    }

    /// Renders the Playwright selector string for this target.
    ///
    /// Role lookups use Playwright's `internal:role` engine, which is what
    /// `getByRole` compiles to in the official clients.
    pub fn to_selector(&self) -> String {
        match self {
            Target::Css(selector) => selector.clone(),
            Target::Role { role, name, exact } => match name {
                Some(name) => format!(
                    "internal:role={}[name={}]",
                    role,
                    escape_for_attribute_selector(name, *exact)
                ),
                None => format!("internal:role={role}"),
            },
        }
    }

    /// Resolves the target against a page.
    pub async fn resolve(&self, page: &Page) -> Locator {
        page.locator(&self.to_selector()).await
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_selector())
    }
}

impl From<&str> for Target {
    fn from(selector: &str) -> Self {
        Target::css(selector)
    }
}

/// Quotes a value for use inside `[name=...]`, suffixed `s` (exact) or `i`.
fn escape_for_attribute_selector(value: &str, exact: bool) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"{}", escaped, if exact { 's' } else { 'i' })
}
