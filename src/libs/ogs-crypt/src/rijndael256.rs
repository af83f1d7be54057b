//! Rijndael-256-256 keyed permutation
//!
//! Rijndael with a 256-bit block and a 256-bit key, used as the PRP `E_K`
//! of Milenage-256. The cipher is built from two AES encryption rounds over
//! the 2x16-byte halves of the state plus a fixed 32-byte permutation applied
//! before every round, which realises the Rijndael-256 ShiftRows offsets
//! (0, 1, 3, 4) on top of the AES ones.
//!
//! Every instance owns its round keys; there is no shared state.

use zeroize::Zeroize;

/// Block size in bytes (256 bits)
pub const BLOCK_SIZE: usize = 32;

/// Key size in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

/// Number of rounds for Nb = 8, Nk = 8
const ROUNDS: usize = 14;

/// Number of 32-bit words in the expanded key: Nb * (Nr + 1)
const EXPANDED_WORDS: usize = 120;

/// AES S-box
const SBOX: [u8; 256] = [
    0x63, 0x7c, 0x77, 0x7b, 0xf2, 0x6b, 0x6f, 0xc5, 0x30, 0x01, 0x67, 0x2b, 0xfe, 0xd7, 0xab, 0x76,
    0xca, 0x82, 0xc9, 0x7d, 0xfa, 0x59, 0x47, 0xf0, 0xad, 0xd4, 0xa2, 0xaf, 0x9c, 0xa4, 0x72, 0xc0,
    0xb7, 0xfd, 0x93, 0x26, 0x36, 0x3f, 0xf7, 0xcc, 0x34, 0xa5, 0xe5, 0xf1, 0x71, 0xd8, 0x31, 0x15,
    0x04, 0xc7, 0x23, 0xc3, 0x18, 0x96, 0x05, 0x9a, 0x07, 0x12, 0x80, 0xe2, 0xeb, 0x27, 0xb2, 0x75,
    0x09, 0x83, 0x2c, 0x1a, 0x1b, 0x6e, 0x5a, 0xa0, 0x52, 0x3b, 0xd6, 0xb3, 0x29, 0xe3, 0x2f, 0x84,
    0x53, 0xd1, 0x00, 0xed, 0x20, 0xfc, 0xb1, 0x5b, 0x6a, 0xcb, 0xbe, 0x39, 0x4a, 0x4c, 0x58, 0xcf,
    0xd0, 0xef, 0xaa, 0xfb, 0x43, 0x4d, 0x33, 0x85, 0x45, 0xf9, 0x02, 0x7f, 0x50, 0x3c, 0x9f, 0xa8,
    0x51, 0xa3, 0x40, 0x8f, 0x92, 0x9d, 0x38, 0xf5, 0xbc, 0xb6, 0xda, 0x21, 0x10, 0xff, 0xf3, 0xd2,
    0xcd, 0x0c, 0x13, 0xec, 0x5f, 0x97, 0x44, 0x17, 0xc4, 0xa7, 0x7e, 0x3d, 0x64, 0x5d, 0x19, 0x73,
    0x60, 0x81, 0x4f, 0xdc, 0x22, 0x2a, 0x90, 0x88, 0x46, 0xee, 0xb8, 0x14, 0xde, 0x5e, 0x0b, 0xdb,
    0xe0, 0x32, 0x3a, 0x0a, 0x49, 0x06, 0x24, 0x5c, 0xc2, 0xd3, 0xac, 0x62, 0x91, 0x95, 0xe4, 0x79,
    0xe7, 0xc8, 0x37, 0x6d, 0x8d, 0xd5, 0x4e, 0xa9, 0x6c, 0x56, 0xf4, 0xea, 0x65, 0x7a, 0xae, 0x08,
    0xba, 0x78, 0x25, 0x2e, 0x1c, 0xa6, 0xb4, 0xc6, 0xe8, 0xdd, 0x74, 0x1f, 0x4b, 0xbd, 0x8b, 0x8a,
    0x70, 0x3e, 0xb5, 0x66, 0x48, 0x03, 0xf6, 0x0e, 0x61, 0x35, 0x57, 0xb9, 0x86, 0xc1, 0x1d, 0x9e,
    0xe1, 0xf8, 0x98, 0x11, 0x69, 0xd9, 0x8e, 0x94, 0x9b, 0x1e, 0x87, 0xe9, 0xce, 0x55, 0x28, 0xdf,
    0x8c, 0xa1, 0x89, 0x0d, 0xbf, 0xe6, 0x42, 0x68, 0x41, 0x99, 0x2d, 0x0f, 0xb0, 0x54, 0xbb, 0x16,
];

/// Round constants, indexed by i / Nk (index 0 unused)
const RCON: [u8; 15] = [
    0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40,
    0x80, 0x1b, 0x36, 0x6c, 0xd8, 0xab, 0x4d,
];

/// Byte permutation applied to the 32-byte state before each round
const CPI: [usize; BLOCK_SIZE] = [
    0x00, 0x11, 0x16, 0x17, 0x04, 0x05, 0x1a, 0x1b,
    0x08, 0x09, 0x0e, 0x1f, 0x0c, 0x0d, 0x12, 0x13,
    0x10, 0x01, 0x06, 0x07, 0x14, 0x15, 0x0a, 0x0b,
    0x18, 0x19, 0x1e, 0x0f, 0x1c, 0x1d, 0x02, 0x03,
];

/// Multiply by x in GF(2^8)
#[inline]
fn xtime(b: u8) -> u8 {
    if b & 0x80 != 0 {
        (b << 1) ^ 0x1b
    } else {
        b << 1
    }
}

fn sub_bytes(state: &mut [u8; 16]) {
    for b in state.iter_mut() {
        *b = SBOX[*b as usize];
    }
}

/// AES ShiftRows on a column-major 4x4 state (byte index = col * 4 + row)
fn shift_rows(state: &mut [u8; 16]) {
    let old = *state;
    for col in 0..4 {
        for row in 0..4 {
            state[col * 4 + row] = old[((col + row) % 4) * 4 + row];
        }
    }
}

fn mix_columns(state: &mut [u8; 16]) {
    for col in state.chunks_exact_mut(4) {
        let a = [col[0], col[1], col[2], col[3]];
        let t = a[0] ^ a[1] ^ a[2] ^ a[3];
        for i in 0..4 {
            col[i] = a[i] ^ t ^ xtime(a[i] ^ a[(i + 1) % 4]);
        }
    }
}

fn add_round_key(state: &mut [u8; 16], round_key: &[u8]) {
    for (s, k) in state.iter_mut().zip(round_key) {
        *s ^= k;
    }
}

/// One full AES encryption round (SubBytes, ShiftRows, MixColumns, AddRoundKey)
fn aes_enc_round(state: &mut [u8; 16], round_key: &[u8]) {
    sub_bytes(state);
    shift_rows(state);
    mix_columns(state);
    add_round_key(state, round_key);
}

/// Final AES encryption round (no MixColumns)
fn aes_enc_last(state: &mut [u8; 16], round_key: &[u8]) {
    sub_bytes(state);
    shift_rows(state);
    add_round_key(state, round_key);
}

fn permute(state: &mut [u8; BLOCK_SIZE]) {
    let old = *state;
    for (dst, &src) in state.iter_mut().zip(CPI.iter()) {
        *dst = old[src];
    }
}

/// Expand a 256-bit key into 120 words (stored as bytes, word-major)
fn expand_key(key: &[u8; KEY_SIZE]) -> [u8; EXPANDED_WORDS * 4] {
    let mut w = [0u8; EXPANDED_WORDS * 4];
    w[..KEY_SIZE].copy_from_slice(key);

    for i in 8..EXPANDED_WORDS {
        let mut temp = [0u8; 4];
        temp.copy_from_slice(&w[(i - 1) * 4..i * 4]);

        if i % 8 == 0 {
            temp.rotate_left(1);
            for b in temp.iter_mut() {
                *b = SBOX[*b as usize];
            }
            temp[0] ^= RCON[i / 8];
        } else if i % 8 == 4 {
            for b in temp.iter_mut() {
                *b = SBOX[*b as usize];
            }
        }

        for j in 0..4 {
            w[i * 4 + j] = w[(i - 8) * 4 + j] ^ temp[j];
        }
    }

    w
}

/// Rijndael-256-256 cipher context
#[derive(Clone)]
pub struct Rijndael256 {
    round_keys: [u8; EXPANDED_WORDS * 4],
}

impl Rijndael256 {
    /// Run the key schedule for the given 256-bit key
    pub fn new(key: &[u8; KEY_SIZE]) -> Self {
        Self {
            round_keys: expand_key(key),
        }
    }

    fn round_key(&self, round: usize) -> &[u8] {
        &self.round_keys[round * BLOCK_SIZE..(round + 1) * BLOCK_SIZE]
    }

    /// Encrypt a single 32-byte block, returning the result
    pub fn encrypt_block(&self, input: &[u8; BLOCK_SIZE]) -> [u8; BLOCK_SIZE] {
        let mut out = *input;
        for (o, k) in out.iter_mut().zip(self.round_key(0)) {
            *o ^= k;
        }

        for round in 1..ROUNDS {
            permute(&mut out);
            round_pair(&mut out, self.round_key(round), aes_enc_round);
        }

        permute(&mut out);
        round_pair(&mut out, self.round_key(ROUNDS), aes_enc_last);

        out
    }
}

impl Drop for Rijndael256 {
    fn drop(&mut self) {
        self.round_keys.zeroize();
    }
}

/// Apply an AES round to both 16-byte halves of the state
fn round_pair(state: &mut [u8; BLOCK_SIZE], round_key: &[u8], round: fn(&mut [u8; 16], &[u8])) {
    for (half, rk) in state.chunks_exact_mut(16).zip(round_key.chunks_exact(16)) {
        let mut block = [0u8; 16];
        block.copy_from_slice(half);
        round(&mut block, rk);
        half.copy_from_slice(&block);
    }
}
