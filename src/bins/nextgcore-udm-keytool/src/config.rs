//! Configuration Management
//!
//! YAML configuration of the key tool: which custodian recovers permanent
//! keys, the local protecting keys, the Milenage-256 parameter block and
//! the SSM transport.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use ogs_crypt::key_unwrap::ProtectionAlgorithm;
use ogs_crypt::milenage256::{Milenage256Config, OP_SIZE};
use ogs_ssm::{SsmClientConfig, SsmCredentials};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default SSM request timeout in milliseconds
pub const DEFAULT_SSM_TIMEOUT_MS: u64 = 3000;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Failed to read {path}: {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Where permanent keys are recovered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustodianKind {
    #[default]
    Local,
    Ssm,
}

/// Top-level configuration document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UdmKeyConfig {
    #[serde(default)]
    pub udm: UdmConf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssm: Option<SsmConf>,
}

/// `udm:` section
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct UdmConf {
    #[serde(default)]
    pub key_custodian: CustodianKind,
    /// Protecting keys by label, hex encoded
    #[serde(default)]
    pub protecting_keys: HashMap<String, String>,
    #[serde(default)]
    pub milenage: MilenageConf,
}

impl fmt::Debug for UdmConf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut labels: Vec<&String> = self.protecting_keys.keys().collect();
        labels.sort();
        f.debug_struct("UdmConf")
            .field("key_custodian", &self.key_custodian)
            .field("protecting_keys", &labels)
            .field("milenage", &self.milenage)
            .finish()
    }
}

/// `udm.milenage:` section, widths in bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MilenageConf {
    pub key_size: usize,
    pub res_size: usize,
    pub ck_size: usize,
    pub ik_size: usize,
    pub mac_size: usize,
    pub rand_size: usize,
    pub sqn_size: usize,
    pub ak_size: usize,
    /// OP, 64 hex characters; all-zero when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,
}

impl Default for MilenageConf {
    fn default() -> Self {
        let d = Milenage256Config::default();
        Self {
            key_size: d.key_size,
            res_size: d.res_size,
            ck_size: d.ck_size,
            ik_size: d.ik_size,
            mac_size: d.mac_size,
            rand_size: d.rand_size,
            sqn_size: d.sqn_size,
            ak_size: d.ak_size,
            op: None,
        }
    }
}

/// `ssm:` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SsmConf {
    /// Base URL of the SSM
    pub host: String,
    #[serde(default)]
    pub tls_insecure: bool,
    #[serde(default = "default_ssm_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtls: Option<MtlsConf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<LoginConf>,
}

fn default_ssm_timeout_ms() -> u64 {
    DEFAULT_SSM_TIMEOUT_MS
}

/// `ssm.mtls:` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MtlsConf {
    pub crt: String,
    pub key: String,
    pub ca: String,
}

/// `ssm.login:` section
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginConf {
    pub service_id: String,
    pub password: String,
}

impl fmt::Debug for LoginConf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginConf")
            .field("service_id", &self.service_id)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl UdmKeyConfig {
    /// Load and validate a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.display().to_string(),
            source,
        })?;
        log::debug!("Configuration file loaded ({} bytes)", content.len());
        Self::from_yaml_str(&content)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (label, key_hex) in &self.udm.protecting_keys {
            let key = hex::decode(key_hex).map_err(|e| {
                ConfigError::ValidationError(format!("protecting key {label}: {e}"))
            })?;
            ProtectionAlgorithm::from_key_len(key.len()).map_err(|e| {
                ConfigError::ValidationError(format!("protecting key {label}: {e}"))
            })?;
        }

        self.milenage_config()?;

        match (&self.udm.key_custodian, &self.ssm) {
            (CustodianKind::Ssm, None) => {
                return Err(ConfigError::ValidationError(
                    "key_custodian is ssm but no ssm section is configured".to_string(),
                ))
            }
            (_, Some(ssm)) if ssm.host.is_empty() => {
                return Err(ConfigError::ValidationError("ssm.host is empty".to_string()))
            }
            _ => {}
        }

        Ok(())
    }

    /// Build the Milenage-256 parameter block
    pub fn milenage_config(&self) -> Result<Milenage256Config, ConfigError> {
        let m = &self.udm.milenage;

        let mut op = [0u8; OP_SIZE];
        if let Some(op_hex) = &m.op {
            let bytes = hex::decode(op_hex)
                .map_err(|e| ConfigError::ValidationError(format!("milenage.op: {e}")))?;
            if bytes.len() != OP_SIZE {
                return Err(ConfigError::ValidationError(format!(
                    "milenage.op must be {OP_SIZE} bytes, got {}",
                    bytes.len()
                )));
            }
            op.copy_from_slice(&bytes);
        }

        let config = Milenage256Config {
            key_size: m.key_size,
            res_size: m.res_size,
            ck_size: m.ck_size,
            ik_size: m.ik_size,
            mac_size: m.mac_size,
            rand_size: m.rand_size,
            sqn_size: m.sqn_size,
            ak_size: m.ak_size,
            ..Milenage256Config::with_op(op)
        };
        config
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        Ok(config)
    }

    /// Build the SSM client configuration, resolving login credentials
    /// from the process environment when none are configured
    pub fn ssm_client_config(&self) -> Result<SsmClientConfig, ConfigError> {
        self.ssm_client_config_with(|name| std::env::var(name).ok())
    }

    /// Same as [`UdmKeyConfig::ssm_client_config`] with an explicit variable lookup
    pub fn ssm_client_config_with<F>(&self, lookup: F) -> Result<SsmClientConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ssm = self
            .ssm
            .as_ref()
            .ok_or_else(|| ConfigError::ValidationError("no ssm section configured".to_string()))?;

        let configured = ssm
            .login
            .as_ref()
            .map(|l| SsmCredentials::new(l.service_id.clone(), l.password.clone()));
        let credentials = SsmCredentials::resolve_with(configured, lookup)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        let mut config = SsmClientConfig::new(ssm.host.clone())
            .with_request_timeout(Duration::from_millis(ssm.timeout_ms))
            .with_insecure_skip_verify(ssm.tls_insecure)
            .with_credentials(credentials);
        if let Some(mtls) = &ssm.mtls {
            config = config.with_mtls(mtls.crt.clone(), mtls.key.clone(), mtls.ca.clone());
        }

        Ok(config)
    }
}
