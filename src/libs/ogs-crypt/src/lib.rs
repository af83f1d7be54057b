//! NextGCore UDM Cryptographic Library
//!
//! Subscriber-credential cryptography used by the UDM: recovery of
//! protected permanent keys and the Milenage-256 authentication functions.

pub mod rijndael256; // Rijndael-256-256 keyed permutation
pub mod milenage256; // Milenage-256 algorithm set
pub mod aes;         // AES ECB decryption
pub mod des;         // DES / 3DES ECB decryption
pub mod key_unwrap;  // Protected key recovery
