//! Subscriber credential fixtures
//!
//! Milenage-256 test set 4d (256-bit key) and a 128-bit key variant, with
//! the permanent key in each at-rest form the UDM may receive.

use std::sync::Arc;

use ogs_crypt::milenage256::Milenage256Config;

/// Test subscriber credentials
#[derive(Debug, Clone)]
pub struct TestSubscriber {
    /// Permanent key (Ki), hex
    pub ki: &'static str,
    /// Operator variant (OP), hex
    pub op: &'static str,
    /// Expected OPc, hex
    pub opc: &'static str,
    pub rand: &'static str,
    pub sqn: &'static str,
    pub amf: &'static str,
    /// Protecting key label and hex key
    pub protecting_key_label: &'static str,
    pub protecting_key: &'static str,
    /// Ki encrypted under the protecting key, hex
    pub encrypted_ki: &'static str,
    /// Ki as returned by the SSM
    pub ki_base64: &'static str,
    pub expected: ExpectedVectors,
}

/// Expected Milenage-256 outputs, hex
#[derive(Debug, Clone)]
pub struct ExpectedVectors {
    pub mac_a: &'static str,
    pub res: &'static str,
    pub ck: &'static str,
    pub ak: &'static str,
}

impl TestSubscriber {
    /// Test set 4d, Ki protected with 3DES
    pub fn test_set_4d() -> Self {
        Self {
            ki: "aff1951a2a5149caf59d9e5fc5c5995473536ba65a41f744010e8fc1fa11fe4d",
            op: "3d5f059e24d37533f7dd09a1745afdc256229951c0ddb459df1977edcc9a631a",
            opc: "b5a3105ad5a3188cc59cb46690a4df298339213d16b24c73f52c654fb0367cf6",
            rand: "090ccce38904bdc40c509b2342f13522",
            sqn: "dc1498b4d7bd",
            amf: "93d7",
            protecting_key_label: "k4-3des",
            protecting_key: "0123456789abcdeffedcba987654321089abcdef01234567",
            encrypted_ki: "fbdfa9d57eab41367f01d8dc00f2c2d7bab0c6ae4a6a77fc57c6f844d6636119",
            ki_base64: "r/GVGipRScr1nZ5fxcWZVHNTa6ZaQfdEAQ6PwfoR/k0=",
            expected: ExpectedVectors {
                mac_a: "9c79c4a45b771187",
                res: "aedd7ff35e1375f6",
                ck: "b7cb9b55d17bd311b64da411f6513ea5f1fff5795bfd91a5d463f18704c26178",
                ak: "fccd9c204f14",
            },
        }
    }

    /// 128-bit Ki protected with AES-128
    pub fn key_128() -> Self {
        Self {
            ki: "465b5ce8b199b49faa5f0a2ee238a6bc",
            op: "3d5f059e24d37533f7dd09a1745afdc256229951c0ddb459df1977edcc9a631a",
            opc: "31d7c707cb7fe3d55b0d120e182d7cc8e0e2fe5d053cd5c4af8741c2f6ea59e7",
            rand: "090ccce38904bdc40c509b2342f13522",
            sqn: "dc1498b4d7bd",
            amf: "93d7",
            protecting_key_label: "k4-aes",
            protecting_key: "000102030405060708090a0b0c0d0e0f",
            encrypted_ki: "e42c646c9acaacd57c8480a02a3dee8e",
            ki_base64: "Rltc6LGZtJ+qXwou4jimvA==",
            expected: ExpectedVectors {
                mac_a: "7b40dedeabdcccae",
                res: "62beb69d10e4be66",
                ck: "91f0676dfeae3b6c3ab53dbfb3b847a2",
                ak: "c074b4702d72",
            },
        }
    }

    /// Parameter block matching the key width of this subscriber
    pub fn milenage_config(&self) -> Arc<Milenage256Config> {
        let op: [u8; 32] = hex::decode(self.op)
            .expect("fixture OP is hex")
            .try_into()
            .expect("fixture OP is 32 bytes");
        let mut config = Milenage256Config::with_op(op);
        if self.ki.len() == 32 {
            config.key_size = 16;
            config.ck_size = 16;
            config.ik_size = 16;
        }
        Arc::new(config)
    }

    /// YAML `milenage:` block for this subscriber
    pub fn milenage_yaml(&self) -> String {
        let cfg = self.milenage_config();
        format!(
            "  milenage:\n    key_size: {}\n    ck_size: {}\n    ik_size: {}\n    op: \"{}\"\n",
            cfg.key_size, cfg.ck_size, cfg.ik_size, self.op
        )
    }
}
