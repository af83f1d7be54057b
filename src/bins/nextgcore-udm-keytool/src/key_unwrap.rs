//! Permanent key recovery service
//!
//! Routes each unwrap request to exactly one custodian: local block cipher
//! unwrap under a configured protecting key, or decryption by the SSM.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ogs_crypt::key_unwrap::unwrap_key_hex;
use ogs_ssm::{decrypt_aead, decrypt_plain, DecryptAesGcmRequest, DecryptRequest, SsmClient};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use zeroize::Zeroizing;

use crate::config::{ConfigError, CustodianKind, UdmKeyConfig};
use crate::error::CredentialError;

/// Encrypted permanent key plus everything needed to recover it
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct UnwrapRequest {
    /// Protecting key label (local lookup key or SSM key label)
    pub key_label: String,
    /// Encrypted permanent key; hex for local unwrap
    pub cipher: String,
    #[serde(default)]
    pub encryption_algorithm: i32,
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub iv: String,
    /// AES-GCM tag; selects the AEAD SSM endpoint when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aad: Option<String>,
    /// Hex protecting key used instead of a configured label (local only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protecting_key: Option<String>,
}

impl UnwrapRequest {
    pub fn new(key_label: impl Into<String>, cipher: impl Into<String>) -> Self {
        Self {
            key_label: key_label.into(),
            cipher: cipher.into(),
            ..Default::default()
        }
    }
}

impl fmt::Debug for UnwrapRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnwrapRequest")
            .field("key_label", &self.key_label)
            .field("encryption_algorithm", &self.encryption_algorithm)
            .field("id", &self.id)
            .field("aead", &self.tag.is_some())
            .field("inline_protecting_key", &self.protecting_key.is_some())
            .finish()
    }
}

/// Text encoding of a recovered permanent key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEncoding {
    /// Lowercase hex, produced by local unwrap
    Hex,
    /// Base64, returned verbatim by the SSM
    Base64,
}

/// Recovered permanent key (Ki)
#[derive(Clone)]
pub struct PermanentKey {
    text: Zeroizing<String>,
    encoding: KeyEncoding,
}

impl PermanentKey {
    pub fn new(text: String, encoding: KeyEncoding) -> Self {
        Self {
            text: Zeroizing::new(text),
            encoding,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn encoding(&self) -> KeyEncoding {
        self.encoding
    }

    /// Decode the key for vector generation
    pub fn to_bytes(&self) -> Result<Zeroizing<Vec<u8>>, CredentialError> {
        let bytes = match self.encoding {
            KeyEncoding::Hex => {
                hex::decode(self.text.as_str()).map_err(|e| CredentialError::hex("PermanentKey", e))?
            }
            KeyEncoding::Base64 => STANDARD.decode(self.text.as_str()).map_err(|e| {
                CredentialError::InvalidEncoding {
                    field: "PermanentKey",
                    encoding: "base64",
                    reason: e.to_string(),
                }
            })?,
        };
        Ok(Zeroizing::new(bytes))
    }
}

impl fmt::Debug for PermanentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermanentKey")
            .field("encoding", &self.encoding)
            .field("text", &"<redacted>")
            .finish()
    }
}

/// Holder of the protecting keys
pub enum KeyCustodian {
    /// Protecting keys held locally, hex by label
    Local {
        protecting_keys: HashMap<String, Zeroizing<String>>,
    },
    /// Decryption delegated to the SSM
    Ssm {
        client: Arc<SsmClient>,
        timeout: Duration,
    },
}

impl fmt::Debug for KeyCustodian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { protecting_keys } => f
                .debug_struct("Local")
                .field("labels", &protecting_keys.len())
                .finish(),
            Self::Ssm { client, timeout } => f
                .debug_struct("Ssm")
                .field("client", client)
                .field("timeout", timeout)
                .finish(),
        }
    }
}

/// Single entry point for permanent key recovery
#[derive(Debug)]
pub struct KeyUnwrapService {
    custodian: KeyCustodian,
}

impl KeyUnwrapService {
    pub fn new(custodian: KeyCustodian) -> Self {
        Self { custodian }
    }

    /// Build the service from configuration, creating the SSM client when needed
    pub fn from_config(config: &UdmKeyConfig) -> Result<Self, ConfigError> {
        let custodian = match config.udm.key_custodian {
            CustodianKind::Local => KeyCustodian::Local {
                protecting_keys: config
                    .udm
                    .protecting_keys
                    .iter()
                    .map(|(label, key)| (label.clone(), Zeroizing::new(key.clone())))
                    .collect(),
            },
            CustodianKind::Ssm => {
                let client_config = config.ssm_client_config()?;
                let timeout = client_config.request_timeout;
                let client = SsmClient::new(client_config)
                    .map_err(|e| ConfigError::ValidationError(format!("SSM client: {e}")))?;
                KeyCustodian::Ssm {
                    client: Arc::new(client),
                    timeout,
                }
            }
        };
        log::info!("Key unwrap service using {:?} custodian", config.udm.key_custodian);
        Ok(Self::new(custodian))
    }

    pub fn custodian(&self) -> &KeyCustodian {
        &self.custodian
    }

    /// Recover the permanent key described by `request`
    pub async fn unwrap(&self, request: &UnwrapRequest) -> Result<PermanentKey, CredentialError> {
        self.unwrap_with_deadline(request, None).await
    }

    /// Same as [`KeyUnwrapService::unwrap`], bounded by the caller's
    /// deadline as well as the configured SSM timeout, whichever is earlier
    pub async fn unwrap_with_deadline(
        &self,
        request: &UnwrapRequest,
        deadline: Option<Instant>,
    ) -> Result<PermanentKey, CredentialError> {
        match &self.custodian {
            KeyCustodian::Local { protecting_keys } => {
                let protecting_key = match &request.protecting_key {
                    Some(key) => key.as_str(),
                    None => protecting_keys
                        .get(&request.key_label)
                        .map(|k| k.as_str())
                        .ok_or_else(|| CredentialError::UnknownKeyLabel(request.key_label.clone()))?,
                };

                let plain = unwrap_key_hex(protecting_key, &request.cipher).map_err(|e| {
                    log::error!("Local unwrap failed for key_label={}: {e}", request.key_label);
                    CredentialError::from(e)
                })?;
                Ok(PermanentKey::new(plain, KeyEncoding::Hex))
            }

            KeyCustodian::Ssm { client, timeout } => {
                let configured = Instant::now() + *timeout;
                let deadline = Some(deadline.map_or(configured, |d| d.min(configured)));
                let plain = match &request.tag {
                    Some(tag) => {
                        let req = DecryptAesGcmRequest {
                            key_label: request.key_label.clone(),
                            cipher: request.cipher.clone(),
                            id: request.id,
                            iv: request.iv.clone(),
                            tag: tag.clone(),
                            aad: request.aad.clone().unwrap_or_default(),
                        };
                        decrypt_aead(client, &req, deadline).await
                    }
                    None => {
                        let req = DecryptRequest {
                            key_label: request.key_label.clone(),
                            cipher: request.cipher.clone(),
                            encryption_algorithm: request.encryption_algorithm,
                            id: request.id,
                            iv: request.iv.clone(),
                        };
                        decrypt_plain(client, &req, deadline).await
                    }
                }
                .map_err(CredentialError::Remote)?;

                Ok(PermanentKey::new(plain, KeyEncoding::Base64))
            }
        }
    }
}
