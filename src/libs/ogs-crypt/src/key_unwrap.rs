//! Protected Subscriber Key Recovery
//!
//! Recovers a permanent key (Ki) stored encrypted under a protecting key.
//! The block cipher is selected purely by protecting-key length:
//!
//! | Key length | Algorithm | Ciphertext |
//! |---|---|---|
//! | 8  | DES     | one 8-byte block |
//! | 24 | 3DES    | non-zero multiple of 8, blocks decrypted independently |
//! | 16 | AES-128 | one 16-byte block |
//! | 32 | AES-256 | one 16-byte block |

use std::fmt;

use thiserror::Error;
use zeroize::Zeroizing;

use crate::aes::{aes_ecb_decrypt, AES_BLOCK_SIZE};
use crate::des::{des_ecb_decrypt, tdes_ecb_decrypt, DES_BLOCK_SIZE};

/// Block cipher used to protect a stored key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectionAlgorithm {
    Des,
    TripleDes,
    Aes128,
    Aes256,
}

impl ProtectionAlgorithm {
    /// Select the algorithm from the protecting key length in bytes
    pub fn from_key_len(len: usize) -> Result<Self, UnwrapError> {
        match len {
            8 => Ok(Self::Des),
            24 => Ok(Self::TripleDes),
            16 => Ok(Self::Aes128),
            32 => Ok(Self::Aes256),
            other => Err(UnwrapError::UnsupportedKeySize(other)),
        }
    }

    pub fn block_size(&self) -> usize {
        match self {
            Self::Des | Self::TripleDes => DES_BLOCK_SIZE,
            Self::Aes128 | Self::Aes256 => AES_BLOCK_SIZE,
        }
    }

    /// Check the ciphertext length before any primitive is invoked
    fn check_ciphertext(&self, len: usize) -> Result<(), UnwrapError> {
        let block = self.block_size();
        let ok = match self {
            Self::TripleDes => len != 0 && len % block == 0,
            _ => len == block,
        };
        if !ok {
            return Err(UnwrapError::BlockSizeMismatch {
                algorithm: *self,
                expected: block,
                actual: len,
            });
        }
        Ok(())
    }
}

impl fmt::Display for ProtectionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Des => write!(f, "DES"),
            Self::TripleDes => write!(f, "3DES"),
            Self::Aes128 => write!(f, "AES-128"),
            Self::Aes256 => write!(f, "AES-256"),
        }
    }
}

/// Key unwrap errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnwrapError {
    #[error("Invalid hex encoding in {field}: {reason}")]
    InvalidEncoding { field: &'static str, reason: String },

    #[error("invalid encryption key size: {0} bytes")]
    UnsupportedKeySize(usize),

    #[error("Ciphertext length {actual} does not fit {algorithm} block size {expected}")]
    BlockSizeMismatch {
        algorithm: ProtectionAlgorithm,
        expected: usize,
        actual: usize,
    },

    #[error("{algorithm} decryption failed: {reason}")]
    DecryptionFailed {
        algorithm: ProtectionAlgorithm,
        reason: String,
    },
}

/// Decrypt `encrypted_ki` under `protecting_key`
pub fn unwrap_key(
    protecting_key: &[u8],
    encrypted_ki: &[u8],
) -> Result<Zeroizing<Vec<u8>>, UnwrapError> {
    let algorithm = ProtectionAlgorithm::from_key_len(protecting_key.len())?;
    algorithm.check_ciphertext(encrypted_ki.len())?;

    log::debug!(
        "Unwrapping {}-byte key with {}",
        encrypted_ki.len(),
        algorithm
    );

    let failed = |reason: String| UnwrapError::DecryptionFailed { algorithm, reason };
    match algorithm {
        ProtectionAlgorithm::Des => {
            des_ecb_decrypt(protecting_key, encrypted_ki).map_err(|e| failed(e.to_string()))
        }
        ProtectionAlgorithm::TripleDes => {
            tdes_ecb_decrypt(protecting_key, encrypted_ki).map_err(|e| failed(e.to_string()))
        }
        ProtectionAlgorithm::Aes128 | ProtectionAlgorithm::Aes256 => {
            aes_ecb_decrypt(protecting_key, encrypted_ki).map_err(|e| failed(e.to_string()))
        }
    }
}

/// Hex in, lowercase hex out
pub fn unwrap_key_hex(
    protecting_key_hex: &str,
    encrypted_ki_hex: &str,
) -> Result<String, UnwrapError> {
    let protecting_key = Zeroizing::new(decode_hex("protecting key", protecting_key_hex)?);
    let encrypted_ki = decode_hex("encrypted key", encrypted_ki_hex)?;

    let plain = unwrap_key(&protecting_key, &encrypted_ki)?;
    Ok(hex::encode(&*plain))
}

fn decode_hex(field: &'static str, input: &str) -> Result<Vec<u8>, UnwrapError> {
    hex::decode(input.trim()).map_err(|e| UnwrapError::InvalidEncoding {
        field,
        reason: e.to_string(),
    })
}
