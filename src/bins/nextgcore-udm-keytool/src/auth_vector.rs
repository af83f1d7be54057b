//! Authentication vector generation
//!
//! Thin facade over the Milenage-256 functions bound to one shared,
//! immutable parameter block.

use std::sync::Arc;

use ogs_crypt::milenage256::{
    milenage256_generate, milenage256_generate_with_opc, milenage256_opc, AuthVectorSet,
    Milenage256Config, MilenageError, OP_SIZE,
};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::CredentialError;

/// Hex rendering of an [`AuthVectorSet`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthVectorHex {
    pub rand: String,
    pub opc: String,
    pub mac_a: String,
    pub mac_s: String,
    pub res: String,
    pub ck: String,
    pub ik: String,
    pub ak: String,
    pub ak_star: String,
    /// (SQN xor AK) || AMF || MAC-A, present when SQN and AK widths match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autn: Option<String>,
}

/// Milenage-256 generator sharing one parameter block
#[derive(Debug, Clone)]
pub struct AuthVectorGenerator {
    config: Arc<Milenage256Config>,
}

impl AuthVectorGenerator {
    pub fn new(config: Arc<Milenage256Config>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Milenage256Config {
        &self.config
    }

    /// OPc for `key` under the configured OP
    pub fn opc(&self, key: &[u8]) -> Result<[u8; OP_SIZE], MilenageError> {
        milenage256_opc(&self.config, key)
    }

    pub fn generate(
        &self,
        key: &[u8],
        rand: &[u8],
        sqn: &[u8],
        amf: &[u8],
    ) -> Result<AuthVectorSet, MilenageError> {
        milenage256_generate(&self.config, key, rand, sqn, amf)
    }

    pub fn generate_with_opc(
        &self,
        opc: &[u8; OP_SIZE],
        key: &[u8],
        rand: &[u8],
        sqn: &[u8],
        amf: &[u8],
    ) -> Result<AuthVectorSet, MilenageError> {
        milenage256_generate_with_opc(&self.config, opc, key, rand, sqn, amf)
    }

    /// Hex in, hex out; OPc is derived from OP when `opc_hex` is `None`
    pub fn generate_hex(
        &self,
        key: &[u8],
        opc_hex: Option<&str>,
        rand_hex: &str,
        sqn_hex: &str,
        amf_hex: &str,
    ) -> Result<AuthVectorHex, CredentialError> {
        let rand = hex::decode(rand_hex).map_err(|e| CredentialError::hex("RAND", e))?;
        let sqn = hex::decode(sqn_hex).map_err(|e| CredentialError::hex("SQN", e))?;
        let amf = hex::decode(amf_hex).map_err(|e| CredentialError::hex("AMF", e))?;

        let av = match opc_hex {
            Some(opc_hex) => {
                let bytes =
                    Zeroizing::new(hex::decode(opc_hex).map_err(|e| CredentialError::hex("OPc", e))?);
                let opc: [u8; OP_SIZE] = bytes.as_slice().try_into().map_err(|_| {
                    MilenageError::InvalidInputLength {
                        field: "OPc",
                        expected: OP_SIZE,
                        actual: bytes.len(),
                    }
                })?;
                self.generate_with_opc(&opc, key, &rand, &sqn, &amf)?
            }
            None => self.generate(key, &rand, &sqn, &amf)?,
        };

        let autn = (sqn.len() == av.ak.len()).then(|| {
            let mut autn: Vec<u8> = sqn.iter().zip(&av.ak).map(|(s, a)| s ^ a).collect();
            autn.extend_from_slice(&amf);
            autn.extend_from_slice(&av.mac_a);
            hex::encode(autn)
        });

        Ok(AuthVectorHex {
            rand: hex::encode(&rand),
            opc: hex::encode(av.opc),
            mac_a: hex::encode(&av.mac_a),
            mac_s: hex::encode(&av.mac_s),
            res: hex::encode(&av.res),
            ck: hex::encode(&av.ck),
            ik: hex::encode(&av.ik),
            ak: hex::encode(&av.ak),
            ak_star: hex::encode(&av.ak_star),
            autn,
        })
    }
}
