//! SSM Message Types
//!
//! Request and response bodies of the SSM decrypt endpoints and the
//! RFC 7807 problem report returned to callers on failure.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Decrypt request for ECB/CBC style ciphers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptRequest {
    /// Label of the protecting key held by the SSM
    pub key_label: String,
    /// Encrypted data
    pub cipher: String,
    /// SSM algorithm identifier
    pub encryption_algorithm: i32,
    /// Key identifier within the label
    pub id: i32,
    /// Initialization vector, empty when the cipher has none
    #[serde(default)]
    pub iv: String,
}

/// Decrypt request for AES-GCM
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptAesGcmRequest {
    pub key_label: String,
    pub cipher: String,
    pub id: i32,
    pub iv: String,
    /// Authentication tag
    pub tag: String,
    /// Additional authenticated data
    #[serde(default)]
    pub aad: String,
}

/// Decrypt response
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptResponse {
    pub plain: String,
}

impl fmt::Debug for DecryptResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptResponse")
            .field("plain", &"<redacted>")
            .finish()
    }
}

/// Problem Details - RFC 7807 compliant error response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// A URI reference that identifies the problem type
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub problem_type: Option<String>,
    /// A short, human-readable summary of the problem type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// The HTTP status code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    /// A human-readable explanation specific to this occurrence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Application-specific error cause
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl ProblemDetails {
    pub fn with_status(status: i32) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}

impl fmt::Display for ProblemDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {}",
            self.status.unwrap_or_default(),
            self.cause.as_deref().unwrap_or("-"),
            self.detail.as_deref().unwrap_or("")
        )
    }
}
