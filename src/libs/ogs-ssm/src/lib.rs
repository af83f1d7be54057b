//! NextGCore Secure Storage Module (SSM) Client Library
//!
//! Delegates permanent key decryption to an external SSM over HTTP, with
//! optional TLS and mutual TLS.

pub mod client;
pub mod decrypt;
pub mod error;
pub mod login;
pub mod message;
pub mod tls;

pub use client::{SsmClient, SsmClientConfig};
pub use decrypt::{authentication_rejected, decrypt_aead, decrypt_plain, AUTHENTICATION_REJECTED};
pub use error::{SsmError, SsmResult};
pub use login::SsmCredentials;
pub use message::{DecryptAesGcmRequest, DecryptRequest, DecryptResponse, ProblemDetails};
