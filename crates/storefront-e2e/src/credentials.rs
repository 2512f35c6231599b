// Credentials - login account for the storefront

use crate::error::{Error, Result};
use std::fmt;

pub const USERNAME_ENV: &str = "SAUCE_USERNAME";
pub const PASSWORD_ENV: &str = "SAUCE_PASSWORD";

/// Username/password pair for the storefront login form.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Reads `SAUCE_USERNAME` and `SAUCE_PASSWORD`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredential`] naming the first variable that is
    /// unset or blank.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`Credentials::from_env`] with a custom variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |var: &'static str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or(Error::MissingCredential { var })
        };
        Ok(Self::new(read(USERNAME_ENV)?, read(PASSWORD_ENV)?))
    }

    /// Same password, different account (e.g. `locked_out_user`).
    pub fn with_username(&self, username: impl Into<String>) -> Self {
        Self::new(username, self.password.clone())
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
