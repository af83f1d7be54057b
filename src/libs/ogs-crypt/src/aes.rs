//! AES ECB Operations
//!
//! Wrapper around the `aes` crate for recovering keys protected with a
//! single-block AES-128 or AES-256 ECB encryption.

use aes::cipher::{generic_array::GenericArray, BlockDecrypt, KeyInit};
use aes::{Aes128, Aes256};
use zeroize::Zeroizing;

/// AES block size in bytes
pub const AES_BLOCK_SIZE: usize = 16;

/// Error type for AES operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AesError {
    /// Invalid key size (must be 16 or 32 bytes)
    InvalidKeySize,
    /// Input is not exactly one block
    InvalidInputLength,
}

impl std::fmt::Display for AesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AesError::InvalidKeySize => write!(f, "invalid AES key size"),
            AesError::InvalidInputLength => write!(f, "input is not a single AES block"),
        }
    }
}

enum AesCipher {
    Aes128(Aes128),
    Aes256(Aes256),
}

/// AES decryption context
pub struct AesDecContext {
    cipher: AesCipher,
}

impl AesDecContext {
    /// Set up an AES decryption context, selecting the variant from the key length
    ///
    /// # Arguments
    /// * `key` - 16 bytes for AES-128 or 32 bytes for AES-256
    pub fn new(key: &[u8]) -> Result<Self, AesError> {
        let cipher = match key.len() {
            16 => AesCipher::Aes128(
                Aes128::new_from_slice(key).map_err(|_| AesError::InvalidKeySize)?,
            ),
            32 => AesCipher::Aes256(
                Aes256::new_from_slice(key).map_err(|_| AesError::InvalidKeySize)?,
            ),
            _ => return Err(AesError::InvalidKeySize),
        };
        Ok(Self { cipher })
    }

    /// Decrypt a single 16-byte block
    pub fn decrypt_block(&self, ciphertext: &[u8; AES_BLOCK_SIZE]) -> [u8; AES_BLOCK_SIZE] {
        let mut block = GenericArray::clone_from_slice(ciphertext);
        match &self.cipher {
            AesCipher::Aes128(c) => c.decrypt_block(&mut block),
            AesCipher::Aes256(c) => c.decrypt_block(&mut block),
        }
        block.into()
    }
}

/// AES-ECB decryption of exactly one block, no padding, no IV
pub fn aes_ecb_decrypt(key: &[u8], input: &[u8]) -> Result<Zeroizing<Vec<u8>>, AesError> {
    let ctx = AesDecContext::new(key)?;
    let block: &[u8; AES_BLOCK_SIZE] = input
        .try_into()
        .map_err(|_| AesError::InvalidInputLength)?;

    let plain = Zeroizing::new(ctx.decrypt_block(block));
    Ok(Zeroizing::new(plain.to_vec()))
}
