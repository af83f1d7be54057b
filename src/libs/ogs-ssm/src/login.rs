//! SSM login credentials
//!
//! Credentials come from configuration first, then from the
//! `SSM_SERVICE_ID` / `SSM_PASSWORD` environment variables.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use zeroize::Zeroizing;

use crate::error::{SsmError, SsmResult};

/// Environment variable holding the SSM service id
pub const SSM_SERVICE_ID_ENV: &str = "SSM_SERVICE_ID";
/// Environment variable holding the SSM password
pub const SSM_PASSWORD_ENV: &str = "SSM_PASSWORD";

/// Service id and password presented to the SSM
#[derive(Clone)]
pub struct SsmCredentials {
    pub service_id: String,
    password: Zeroizing<String>,
}

impl SsmCredentials {
    pub fn new(service_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Value of the `Authorization` header (HTTP Basic)
    pub fn basic_authorization(&self) -> Zeroizing<String> {
        let raw = Zeroizing::new(format!("{}:{}", self.service_id, self.password()));
        Zeroizing::new(format!("Basic {}", STANDARD.encode(raw.as_bytes())))
    }

    /// Resolve credentials from configuration, falling back to the process environment
    pub fn resolve(configured: Option<SsmCredentials>) -> SsmResult<Self> {
        Self::resolve_with(configured, |name| std::env::var(name).ok())
    }

    /// Same as [`SsmCredentials::resolve`] with an explicit variable lookup
    pub fn resolve_with<F>(configured: Option<SsmCredentials>, lookup: F) -> SsmResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let creds = match configured {
            Some(creds) => creds,
            None => Self::new(
                lookup(SSM_SERVICE_ID_ENV).unwrap_or_default(),
                lookup(SSM_PASSWORD_ENV).unwrap_or_default(),
            ),
        };

        if creds.service_id.is_empty() || creds.password.is_empty() {
            return Err(SsmError::MissingCredentials);
        }
        Ok(creds)
    }
}

impl fmt::Debug for SsmCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SsmCredentials")
            .field("service_id", &self.service_id)
            .field("password", &"<redacted>")
            .finish()
    }
}
