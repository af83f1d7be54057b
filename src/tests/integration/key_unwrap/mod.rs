//! Local key unwrap integration tests
//!
//! Configuration document in, authentication vector out, with the
//! protecting keys held by the UDM itself.

use std::sync::Arc;

use nextgcore_udm_keytool::{
    AuthVectorGenerator, CredentialError, KeyEncoding, KeyUnwrapService, UdmKeyConfig,
    UnwrapRequest,
};
use ogs_crypt::key_unwrap::UnwrapError;
use ogs_ssm::AUTHENTICATION_REJECTED;

use crate::common::TestSubscriber;

fn local_config(sub: &TestSubscriber) -> UdmKeyConfig {
    let yaml = format!(
        "udm:\n  key_custodian: local\n  protecting_keys:\n    {}: \"{}\"\n    des-1: \"133457799BBCDFF1\"\n{}",
        sub.protecting_key_label,
        sub.protecting_key,
        sub.milenage_yaml()
    );
    UdmKeyConfig::from_yaml_str(&yaml).unwrap()
}

async fn unwrap_and_generate(sub: &TestSubscriber) {
    let config = local_config(sub);
    let service = KeyUnwrapService::from_config(&config).unwrap();
    let generator = AuthVectorGenerator::new(Arc::new(config.milenage_config().unwrap()));

    let ki = service
        .unwrap(&UnwrapRequest::new(sub.protecting_key_label, sub.encrypted_ki))
        .await
        .unwrap();
    assert_eq!(ki.encoding(), KeyEncoding::Hex);
    assert_eq!(ki.as_str(), sub.ki);

    let av = generator
        .generate_hex(&ki.to_bytes().unwrap(), None, sub.rand, sub.sqn, sub.amf)
        .unwrap();
    assert_eq!(av.opc, sub.opc);
    assert_eq!(av.mac_a, sub.expected.mac_a);
    assert_eq!(av.res, sub.expected.res);
    assert_eq!(av.ck, sub.expected.ck);
    assert_eq!(av.ak, sub.expected.ak);
}

/// 3DES-protected 256-bit Ki through to the test set 4d vector
#[tokio::test]
async fn test_3des_ki_to_auth_vector() {
    let _ = env_logger::try_init();
    unwrap_and_generate(&TestSubscriber::test_set_4d()).await;
}

/// AES-128-protected 128-bit Ki through to a vector with 128-bit CK/IK
#[tokio::test]
async fn test_aes128_ki_to_auth_vector() {
    let _ = env_logger::try_init();
    unwrap_and_generate(&TestSubscriber::key_128()).await;
}

#[tokio::test]
async fn test_single_des_label() {
    let _ = env_logger::try_init();
    let service = KeyUnwrapService::from_config(&local_config(&TestSubscriber::test_set_4d())).unwrap();

    let ki = service
        .unwrap(&UnwrapRequest::new("des-1", "85e813540f0ab405"))
        .await
        .unwrap();
    assert_eq!(ki.as_str(), "0123456789abcdef");
}

/// Inline AES-256 protecting key overrides the label lookup
#[tokio::test]
async fn test_inline_aes256_protecting_key() {
    let _ = env_logger::try_init();
    let service = KeyUnwrapService::from_config(&local_config(&TestSubscriber::key_128())).unwrap();

    let request = UnwrapRequest {
        protecting_key: Some(
            "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f".to_string(),
        ),
        ..UnwrapRequest::new("not-configured", "5efd05a8869ad0c3054cb48ec65ede37")
    };
    let ki = service.unwrap(&request).await.unwrap();
    assert_eq!(ki.as_str(), TestSubscriber::key_128().ki);
}

#[tokio::test]
async fn test_failures_map_to_authentication_rejected() {
    let _ = env_logger::try_init();
    let sub = TestSubscriber::test_set_4d();
    let service = KeyUnwrapService::from_config(&local_config(&sub)).unwrap();

    // 3DES needs whole 8-byte blocks
    let err = service
        .unwrap(&UnwrapRequest::new(sub.protecting_key_label, "fbdfa9d57eab4136ff"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CredentialError::Unwrap(UnwrapError::BlockSizeMismatch { .. })
    ));

    let problem = err.to_problem_details();
    assert_eq!(problem.status, Some(403));
    assert_eq!(problem.cause.as_deref(), Some(AUTHENTICATION_REJECTED));

    let err = service
        .unwrap(&UnwrapRequest::new("missing", sub.encrypted_ki))
        .await
        .unwrap_err();
    assert_eq!(err, CredentialError::UnknownKeyLabel("missing".to_string()));
    assert_eq!(err.to_problem_details().status, Some(403));
}

#[test]
fn test_config_rejects_bad_protecting_key() {
    let yaml = "udm:\n  protecting_keys:\n    bad: \"0011223344\"\n";
    assert!(UdmKeyConfig::from_yaml_str(yaml).is_err());
}
