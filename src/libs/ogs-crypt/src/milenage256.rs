//! MILENAGE-256 Algorithm Set
//!
//! 256-bit variant of the 3GPP Milenage authentication and key generation
//! functions, keyed by the Rijndael-256-256 permutation:
//! - OPc: operator variant derived from OP and K
//! - f1: Network authentication (MAC-A)
//! - f1*: Re-synchronization authentication (MAC-S)
//! - f2: User authentication (RES)
//! - f3: Cipher key (CK)
//! - f4: Integrity key (IK)
//! - f5: Anonymity key (AK)
//! - f5*: Re-synchronization anonymity key (AK*)
//! - f5**: Anonymity key derived from MAC-S
//!
//! All field widths come from a [`Milenage256Config`]. Every call builds its
//! own context (padded key, key schedule, OPc) and drops it on return, so a
//! single config can be shared across any number of threads.

use std::fmt;

use thiserror::Error;
use zeroize::Zeroizing;

use crate::rijndael256::{Rijndael256, BLOCK_SIZE, KEY_SIZE as PRP_KEY_SIZE};

/// OP / OPc size in bytes
pub const OP_SIZE: usize = 32;

/// AMF size in bytes
pub const AMF_SIZE: usize = 2;

/// Size of one personalization constant c[i]
pub const C_SIZE: usize = 16;

/// Number of personalization constants
pub const NUM_OF_C: usize = 8;

/// Algorithm name mixed into the OPc derivation
const ALGONAME: &[u8] = b"MILENAGE2.0";

// Function indices. They select c[i] and are encoded in the top bits of IN[0].
const FN_F1_STAR: u8 = 0;
const FN_F1: u8 = 1;
const FN_F2: u8 = 2;
const FN_F3: u8 = 3;
const FN_F4: u8 = 4;
const FN_F5: u8 = 5;
const FN_F5_STAR: u8 = 6;
const FN_F5_STAR_STAR: u8 = 7;

/// Error type for Milenage-256 operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MilenageError {
    /// An input does not have the width required by the configuration
    #[error("Invalid {field} length: expected {expected} bytes, got {actual}")]
    InvalidInputLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The configuration itself is out of range
    #[error("Invalid Milenage-256 configuration: {0}")]
    InvalidConfig(String),
}

/// Milenage-256 parameter block
///
/// Widths are in bytes. Share it behind an `Arc` and build a new value
/// instead of mutating one that is in use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Milenage256Config {
    pub key_size: usize,
    pub res_size: usize,
    pub ck_size: usize,
    pub ik_size: usize,
    pub mac_size: usize,
    pub rand_size: usize,
    pub sqn_size: usize,
    pub ak_size: usize,
    /// Operator variant algorithm configuration field
    pub op: [u8; OP_SIZE],
    /// Personalization constants; c[0] is all-zero by convention
    pub c: [[u8; C_SIZE]; NUM_OF_C],
}

impl Default for Milenage256Config {
    fn default() -> Self {
        let mut c = [[0u8; C_SIZE]; NUM_OF_C];
        for (i, ci) in c.iter_mut().enumerate().skip(1) {
            ci[C_SIZE - 1] = 1 << (i - 1);
        }

        Self {
            key_size: 32,
            res_size: 8,
            ck_size: 32,
            ik_size: 32,
            mac_size: 8,
            rand_size: 16,
            sqn_size: 6,
            ak_size: 6,
            op: [0u8; OP_SIZE],
            c,
        }
    }
}

impl Milenage256Config {
    /// Default widths and constants with the given OP
    pub fn with_op(op: [u8; OP_SIZE]) -> Self {
        Self {
            op,
            ..Default::default()
        }
    }

    /// Check that every width fits the encoding used by the algorithm
    pub fn validate(&self) -> Result<(), MilenageError> {
        if self.key_size != 16 && self.key_size != 32 {
            return Err(MilenageError::InvalidConfig(format!(
                "key_size must be 16 or 32, got {}",
                self.key_size
            )));
        }
        check_range("rand_size", self.rand_size, 2, BLOCK_SIZE)?;
        check_range("sqn_size", self.sqn_size, 5, 12)?;
        check_range("ak_size", self.ak_size, 5, 12)?;
        check_range("res_size", self.res_size, 1, BLOCK_SIZE)?;
        check_range("ck_size", self.ck_size, 1, BLOCK_SIZE)?;
        check_range("ik_size", self.ik_size, 1, BLOCK_SIZE)?;
        check_range("mac_size", self.mac_size, 1, BLOCK_SIZE)?;
        Ok(())
    }
}

fn check_range(name: &str, value: usize, min: usize, max: usize) -> Result<(), MilenageError> {
    if value < min || value > max {
        return Err(MilenageError::InvalidConfig(format!(
            "{name} must be within {min}..={max}, got {value}"
        )));
    }
    Ok(())
}

fn check_len(field: &'static str, input: &[u8], expected: usize) -> Result<(), MilenageError> {
    if input.len() != expected {
        return Err(MilenageError::InvalidInputLength {
            field,
            expected,
            actual: input.len(),
        });
    }
    Ok(())
}

/// Full set of authentication values for one (K, OPc, RAND, SQN, AMF) tuple
#[derive(Clone, PartialEq, Eq)]
pub struct AuthVectorSet {
    pub opc: [u8; OP_SIZE],
    pub mac_a: Vec<u8>,
    pub mac_s: Vec<u8>,
    pub res: Vec<u8>,
    pub ck: Vec<u8>,
    pub ik: Vec<u8>,
    pub ak: Vec<u8>,
    pub ak_star: Vec<u8>,
}

impl fmt::Debug for AuthVectorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthVectorSet")
            .field("mac_a", &self.mac_a.len())
            .field("mac_s", &self.mac_s.len())
            .field("res", &self.res.len())
            .field("ck", &self.ck.len())
            .field("ik", &self.ik.len())
            .field("ak", &self.ak.len())
            .field("ak_star", &self.ak_star.len())
            .finish_non_exhaustive()
    }
}

/// Per-call transform context
struct Milenage256Ctx<'a> {
    config: &'a Milenage256Config,
    cipher: Rijndael256,
    opc: Zeroizing<[u8; OP_SIZE]>,
}

impl<'a> Milenage256Ctx<'a> {
    fn cipher_for(config: &Milenage256Config, key: &[u8]) -> Result<Rijndael256, MilenageError> {
        config.validate()?;
        check_len("key", key, config.key_size)?;

        let mut padded = Zeroizing::new([0u8; PRP_KEY_SIZE]);
        padded[..key.len()].copy_from_slice(key);
        Ok(Rijndael256::new(&padded))
    }

    /// Context with OPc derived from the configured OP
    fn with_op(config: &'a Milenage256Config, key: &[u8]) -> Result<Self, MilenageError> {
        let cipher = Self::cipher_for(config, key)?;
        let opc = Zeroizing::new(derive_opc(config, &cipher));
        Ok(Self { config, cipher, opc })
    }

    /// Context with a caller-supplied OPc
    fn with_opc(
        config: &'a Milenage256Config,
        key: &[u8],
        opc: &[u8; OP_SIZE],
    ) -> Result<Self, MilenageError> {
        let cipher = Self::cipher_for(config, key)?;
        Ok(Self {
            config,
            cipher,
            opc: Zeroizing::new(*opc),
        })
    }

    /// TEMP = E_K(OPc xor RAND)
    fn temp(&self, rand: &[u8]) -> Result<[u8; BLOCK_SIZE], MilenageError> {
        check_len("RAND", rand, self.config.rand_size)?;

        let mut state = *self.opc;
        for (s, r) in state.iter_mut().zip(rand) {
            *s ^= r;
        }
        Ok(self.cipher.encrypt_block(&state))
    }

    /// OUT = E_K(TEMP xor OPc xor IN) xor OPc, full width
    fn out(
        &self,
        temp: &[u8; BLOCK_SIZE],
        fn_idx: u8,
        in1: u8,
        amf: Option<&[u8]>,
        sqn: Option<&[u8]>,
        mac_s: Option<&[u8]>,
    ) -> [u8; BLOCK_SIZE] {
        let cfg = self.config;
        let mut input = [0u8; BLOCK_SIZE];

        input[0] ^= (fn_idx << 5) | (cfg.rand_size as u8 - 2) | (cfg.key_size as u8 >> 5);
        input[1] ^= in1;

        if let Some(amf) = amf {
            for (i, b) in amf.iter().enumerate() {
                input[2 + i] ^= b;
            }
        }
        if let Some(sqn) = sqn {
            for (i, b) in sqn.iter().enumerate() {
                input[4 + i] ^= b;
            }
        }
        if let Some(mac_s) = mac_s {
            for (i, b) in mac_s.iter().take(30).enumerate() {
                input[2 + i] ^= b;
            }
        }

        for (i, b) in cfg.c[fn_idx as usize].iter().enumerate() {
            input[16 + i] ^= b;
        }

        let mut state = *temp;
        for i in 0..BLOCK_SIZE {
            state[i] ^= self.opc[i] ^ input[i];
        }

        let mut out = self.cipher.encrypt_block(&state);
        for (o, c) in out.iter_mut().zip(self.opc.iter()) {
            *o ^= c;
        }
        out
    }

    fn mac_in1(&self) -> u8 {
        (((self.config.sqn_size - 5) as u8) << 5) | (self.config.mac_size as u8 - 1)
    }

    fn ak_in1(&self) -> u8 {
        self.config.ak_size as u8 - 5
    }

    fn f1_variant(
        &self,
        fn_idx: u8,
        rand: &[u8],
        sqn: &[u8],
        amf: &[u8],
    ) -> Result<Vec<u8>, MilenageError> {
        check_len("SQN", sqn, self.config.sqn_size)?;
        check_len("AMF", amf, AMF_SIZE)?;
        let temp = self.temp(rand)?;
        let out = self.out(&temp, fn_idx, self.mac_in1(), Some(amf), Some(sqn), None);
        Ok(out[..self.config.mac_size].to_vec())
    }

    fn rand_only(
        &self,
        fn_idx: u8,
        in1: u8,
        rand: &[u8],
        out_len: usize,
    ) -> Result<Vec<u8>, MilenageError> {
        let temp = self.temp(rand)?;
        let out = self.out(&temp, fn_idx, in1, None, None, None);
        Ok(out[..out_len].to_vec())
    }

    fn generate(&self, rand: &[u8], sqn: &[u8], amf: &[u8]) -> Result<AuthVectorSet, MilenageError> {
        let cfg = self.config;
        check_len("SQN", sqn, cfg.sqn_size)?;
        check_len("AMF", amf, AMF_SIZE)?;
        let temp = self.temp(rand)?;

        let mac_in1 = self.mac_in1();
        let ak_in1 = self.ak_in1();
        let truncate = |out: [u8; BLOCK_SIZE], len: usize| out[..len].to_vec();

        Ok(AuthVectorSet {
            opc: *self.opc,
            mac_a: truncate(
                self.out(&temp, FN_F1, mac_in1, Some(amf), Some(sqn), None),
                cfg.mac_size,
            ),
            mac_s: truncate(
                self.out(&temp, FN_F1_STAR, mac_in1, Some(amf), Some(sqn), None),
                cfg.mac_size,
            ),
            res: truncate(
                self.out(&temp, FN_F2, cfg.res_size as u8 - 1, None, None, None),
                cfg.res_size,
            ),
            ck: truncate(
                self.out(&temp, FN_F3, cfg.ck_size as u8 - 1, None, None, None),
                cfg.ck_size,
            ),
            ik: truncate(
                self.out(&temp, FN_F4, cfg.ik_size as u8 - 1, None, None, None),
                cfg.ik_size,
            ),
            ak: truncate(self.out(&temp, FN_F5, ak_in1, None, None, None), cfg.ak_size),
            ak_star: truncate(
                self.out(&temp, FN_F5_STAR, ak_in1, None, None, None),
                cfg.ak_size,
            ),
        })
    }
}

/// OPc = E_K(E_K(OP) xor V) xor OP, V = (key_size >> 5) || "MILENAGE2.0" || 0..
fn derive_opc(config: &Milenage256Config, cipher: &Rijndael256) -> [u8; OP_SIZE] {
    let mut v = [0u8; BLOCK_SIZE];
    v[0] = (config.key_size >> 5) as u8;
    v[1..1 + ALGONAME.len()].copy_from_slice(ALGONAME);

    let mut opc = cipher.encrypt_block(&config.op);
    for (o, x) in opc.iter_mut().zip(v.iter()) {
        *o ^= x;
    }
    let mut opc = cipher.encrypt_block(&opc);
    for (o, x) in opc.iter_mut().zip(config.op.iter()) {
        *o ^= x;
    }
    opc
}

/// Compute OPc from the configured OP and subscriber key K
pub fn milenage256_opc(
    config: &Milenage256Config,
    key: &[u8],
) -> Result<[u8; OP_SIZE], MilenageError> {
    let cipher = Milenage256Ctx::cipher_for(config, key)?;
    Ok(derive_opc(config, &cipher))
}

/// f1: MAC-A
pub fn milenage256_f1(
    config: &Milenage256Config,
    opc: &[u8; OP_SIZE],
    key: &[u8],
    rand: &[u8],
    sqn: &[u8],
    amf: &[u8],
) -> Result<Vec<u8>, MilenageError> {
    Milenage256Ctx::with_opc(config, key, opc)?.f1_variant(FN_F1, rand, sqn, amf)
}

/// f1*: MAC-S
pub fn milenage256_f1_star(
    config: &Milenage256Config,
    opc: &[u8; OP_SIZE],
    key: &[u8],
    rand: &[u8],
    sqn: &[u8],
    amf: &[u8],
) -> Result<Vec<u8>, MilenageError> {
    Milenage256Ctx::with_opc(config, key, opc)?.f1_variant(FN_F1_STAR, rand, sqn, amf)
}

/// f2: RES
pub fn milenage256_f2(
    config: &Milenage256Config,
    opc: &[u8; OP_SIZE],
    key: &[u8],
    rand: &[u8],
) -> Result<Vec<u8>, MilenageError> {
    let ctx = Milenage256Ctx::with_opc(config, key, opc)?;
    ctx.rand_only(FN_F2, config.res_size as u8 - 1, rand, config.res_size)
}

/// f3: CK
pub fn milenage256_f3(
    config: &Milenage256Config,
    opc: &[u8; OP_SIZE],
    key: &[u8],
    rand: &[u8],
) -> Result<Vec<u8>, MilenageError> {
    let ctx = Milenage256Ctx::with_opc(config, key, opc)?;
    ctx.rand_only(FN_F3, config.ck_size as u8 - 1, rand, config.ck_size)
}

/// f4: IK
pub fn milenage256_f4(
    config: &Milenage256Config,
    opc: &[u8; OP_SIZE],
    key: &[u8],
    rand: &[u8],
) -> Result<Vec<u8>, MilenageError> {
    let ctx = Milenage256Ctx::with_opc(config, key, opc)?;
    ctx.rand_only(FN_F4, config.ik_size as u8 - 1, rand, config.ik_size)
}

/// f5: AK
pub fn milenage256_f5(
    config: &Milenage256Config,
    opc: &[u8; OP_SIZE],
    key: &[u8],
    rand: &[u8],
) -> Result<Vec<u8>, MilenageError> {
    let ctx = Milenage256Ctx::with_opc(config, key, opc)?;
    ctx.rand_only(FN_F5, ctx.ak_in1(), rand, config.ak_size)
}

/// f5*: AK for re-synchronization
pub fn milenage256_f5_star(
    config: &Milenage256Config,
    opc: &[u8; OP_SIZE],
    key: &[u8],
    rand: &[u8],
) -> Result<Vec<u8>, MilenageError> {
    let ctx = Milenage256Ctx::with_opc(config, key, opc)?;
    ctx.rand_only(FN_F5_STAR, ctx.ak_in1(), rand, config.ak_size)
}

/// f5**: AK derived from MAC-S
pub fn milenage256_f5_star_star(
    config: &Milenage256Config,
    opc: &[u8; OP_SIZE],
    key: &[u8],
    rand: &[u8],
    mac_s: &[u8],
) -> Result<Vec<u8>, MilenageError> {
    check_len("MAC-S", mac_s, config.mac_size)?;
    let ctx = Milenage256Ctx::with_opc(config, key, opc)?;
    let in1 = (((config.mac_size - 1) as u8) << 3) | ctx.ak_in1();
    let temp = ctx.temp(rand)?;
    let out = ctx.out(&temp, FN_F5_STAR_STAR, in1, None, None, Some(mac_s));
    Ok(out[..config.ak_size].to_vec())
}

/// Derive OPc from the configured OP, then compute the full vector set
pub fn milenage256_generate(
    config: &Milenage256Config,
    key: &[u8],
    rand: &[u8],
    sqn: &[u8],
    amf: &[u8],
) -> Result<AuthVectorSet, MilenageError> {
    Milenage256Ctx::with_op(config, key)?.generate(rand, sqn, amf)
}

/// Compute the full vector set from a previously derived OPc
pub fn milenage256_generate_with_opc(
    config: &Milenage256Config,
    opc: &[u8; OP_SIZE],
    key: &[u8],
    rand: &[u8],
    sqn: &[u8],
    amf: &[u8],
) -> Result<AuthVectorSet, MilenageError> {
    Milenage256Ctx::with_opc(config, key, opc)?.generate(rand, sqn, amf)
}
