//! DES / Triple-DES ECB Operations
//!
//! Wrapper around the `des` crate. Single DES takes an 8-byte key, 3DES
//! (EDE, three independent keys) a 24-byte key.

use des::cipher::{generic_array::GenericArray, BlockDecrypt, KeyInit};
use des::{Des, TdesEde3};
use zeroize::Zeroizing;

/// DES block size in bytes
pub const DES_BLOCK_SIZE: usize = 8;

/// Error type for DES operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesError {
    /// Invalid key size (must be 8 or 24 bytes)
    InvalidKeySize,
    /// Input length does not fit the block size
    InvalidInputLength,
}

impl std::fmt::Display for DesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DesError::InvalidKeySize => write!(f, "invalid DES key size"),
            DesError::InvalidInputLength => write!(f, "input does not fit the DES block size"),
        }
    }
}

enum DesCipher {
    Des(Des),
    TdesEde3(TdesEde3),
}

/// DES / 3DES decryption context
pub struct DesDecContext {
    cipher: DesCipher,
}

impl DesDecContext {
    /// Set up a decryption context: 8-byte key for DES, 24-byte key for 3DES
    pub fn new(key: &[u8]) -> Result<Self, DesError> {
        let cipher = match key.len() {
            8 => DesCipher::Des(Des::new_from_slice(key).map_err(|_| DesError::InvalidKeySize)?),
            24 => DesCipher::TdesEde3(
                TdesEde3::new_from_slice(key).map_err(|_| DesError::InvalidKeySize)?,
            ),
            _ => return Err(DesError::InvalidKeySize),
        };
        Ok(Self { cipher })
    }

    /// Decrypt a single 8-byte block
    pub fn decrypt_block(&self, ciphertext: &[u8; DES_BLOCK_SIZE]) -> [u8; DES_BLOCK_SIZE] {
        let mut block = GenericArray::clone_from_slice(ciphertext);
        match &self.cipher {
            DesCipher::Des(c) => c.decrypt_block(&mut block),
            DesCipher::TdesEde3(c) => c.decrypt_block(&mut block),
        }
        block.into()
    }

    /// ECB decryption: every block independently, no chaining, no padding
    pub fn decrypt_ecb(&self, input: &[u8]) -> Result<Zeroizing<Vec<u8>>, DesError> {
        if input.is_empty() || input.len() % DES_BLOCK_SIZE != 0 {
            return Err(DesError::InvalidInputLength);
        }

        let mut output = Zeroizing::new(Vec::with_capacity(input.len()));
        for chunk in input.chunks_exact(DES_BLOCK_SIZE) {
            let mut block = [0u8; DES_BLOCK_SIZE];
            block.copy_from_slice(chunk);
            let plain = Zeroizing::new(self.decrypt_block(&block));
            output.extend_from_slice(&*plain);
        }
        Ok(output)
    }
}

/// Single DES ECB decryption of exactly one block
pub fn des_ecb_decrypt(key: &[u8], input: &[u8]) -> Result<Zeroizing<Vec<u8>>, DesError> {
    if key.len() != 8 {
        return Err(DesError::InvalidKeySize);
    }
    if input.len() != DES_BLOCK_SIZE {
        return Err(DesError::InvalidInputLength);
    }
    DesDecContext::new(key)?.decrypt_ecb(input)
}

/// 3DES-EDE ECB decryption of one or more blocks
pub fn tdes_ecb_decrypt(key: &[u8], input: &[u8]) -> Result<Zeroizing<Vec<u8>>, DesError> {
    if key.len() != 24 {
        return Err(DesError::InvalidKeySize);
    }
    DesDecContext::new(key)?.decrypt_ecb(input)
}
