//! NextGCore UDM Key Tool Library
//!
//! Subscriber-credential handling of the UDM: recovery of the permanent
//! key (locally or through the SSM) and Milenage-256 authentication
//! vector generation.

pub mod auth_vector;
pub mod config;
pub mod error;
pub mod key_unwrap;

// Re-export commonly used types
pub use auth_vector::{AuthVectorGenerator, AuthVectorHex};
pub use config::{ConfigError, CustodianKind, UdmKeyConfig};
pub use error::CredentialError;
pub use key_unwrap::{KeyCustodian, KeyEncoding, KeyUnwrapService, PermanentKey, UnwrapRequest};
