//! SSM custodian integration tests
//!
//! The UDM delegates permanent key decryption to a mock SSM and feeds the
//! returned key into Milenage-256.

use std::sync::Arc;
use std::time::{Duration, Instant};

use nextgcore_udm_keytool::{
    AuthVectorGenerator, CredentialError, KeyEncoding, KeyUnwrapService, UdmKeyConfig,
    UnwrapRequest,
};
use ogs_ssm::AUTHENTICATION_REJECTED;

use crate::common::{MockResponse, MockSsm, TestSubscriber};

fn service_for(mock: &MockSsm, timeout_ms: u64, sub: &TestSubscriber) -> (KeyUnwrapService, UdmKeyConfig) {
    let config = UdmKeyConfig::from_yaml_str(&mock.config_yaml(timeout_ms, &sub.milenage_yaml())).unwrap();
    (KeyUnwrapService::from_config(&config).unwrap(), config)
}

fn ssm_request(sub: &TestSubscriber) -> UnwrapRequest {
    UnwrapRequest {
        encryption_algorithm: 3,
        id: 7,
        ..UnwrapRequest::new("ssm-k4", sub.encrypted_ki)
    }
}

/// Base64 Ki from the SSM drives the test set 4d vector
#[tokio::test]
async fn test_ssm_ki_to_auth_vector() {
    let _ = env_logger::try_init();
    let sub = TestSubscriber::test_set_4d();
    let mock = MockSsm::start(MockResponse::plain(sub.ki_base64))
        .await
        .unwrap();
    let (service, config) = service_for(&mock, 3000, &sub);

    let ki = service.unwrap(&ssm_request(&sub)).await.unwrap();
    assert_eq!(ki.encoding(), KeyEncoding::Base64);
    assert_eq!(ki.as_str(), sub.ki_base64);

    let generator = AuthVectorGenerator::new(Arc::new(config.milenage_config().unwrap()));
    let av = generator
        .generate_hex(&ki.to_bytes().unwrap(), None, sub.rand, sub.sqn, sub.amf)
        .unwrap();
    assert_eq!(av.opc, sub.opc);
    assert_eq!(av.mac_a, sub.expected.mac_a);
    assert_eq!(av.res, sub.expected.res);

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/crypto/decrypt");
    assert_eq!(requests[0].authorization.as_deref(), Some("Basic dWRtOnB3"));
    assert_eq!(requests[0].body["keyLabel"], "ssm-k4");
    assert_eq!(requests[0].body["cipher"], sub.encrypted_ki);
    assert_eq!(requests[0].body["encryptionAlgorithm"], 3);
    assert_eq!(requests[0].body["id"], 7);
}

#[tokio::test]
async fn test_ssm_aead_endpoint() {
    let _ = env_logger::try_init();
    let sub = TestSubscriber::key_128();
    let mock = MockSsm::start(MockResponse::plain(sub.ki_base64))
        .await
        .unwrap();
    let (service, _) = service_for(&mock, 3000, &sub);

    let request = UnwrapRequest {
        iv: "000000000000000000000000".to_string(),
        tag: Some("00112233445566778899aabbccddeeff".to_string()),
        aad: Some("udm".to_string()),
        ..ssm_request(&sub)
    };
    let ki = service.unwrap(&request).await.unwrap();
    assert_eq!(hex::encode(&*ki.to_bytes().unwrap()), sub.ki);

    let requests = mock.requests();
    assert_eq!(requests[0].path, "/crypto/decrypt-aes-gcm");
    assert_eq!(requests[0].body["tag"], "00112233445566778899aabbccddeeff");
    assert_eq!(requests[0].body["aad"], "udm");
}

#[tokio::test]
async fn test_ssm_failure_is_authentication_rejected() {
    let _ = env_logger::try_init();
    let sub = TestSubscriber::test_set_4d();
    let mock = MockSsm::start(MockResponse::error(500, "{\"error\":\"hsm offline\"}"))
        .await
        .unwrap();
    let (service, _) = service_for(&mock, 3000, &sub);

    let err = service.unwrap(&ssm_request(&sub)).await.unwrap_err();
    let CredentialError::Remote(problem) = &err else {
        panic!("expected remote failure, got {err:?}");
    };
    assert_eq!(problem.status, Some(403));
    assert_eq!(problem.cause.as_deref(), Some(AUTHENTICATION_REJECTED));
    assert!(problem
        .detail
        .as_deref()
        .unwrap_or_default()
        .starts_with("Failed to decrypt PermanentKey via SSM"));
    assert_eq!(&err.to_problem_details(), problem);
}

#[tokio::test]
async fn test_ssm_malformed_response() {
    let _ = env_logger::try_init();
    let sub = TestSubscriber::test_set_4d();
    let mock = MockSsm::start(MockResponse::error(200, "not json"))
        .await
        .unwrap();
    let (service, _) = service_for(&mock, 3000, &sub);

    let err = service.unwrap(&ssm_request(&sub)).await.unwrap_err();
    assert_eq!(err.to_problem_details().status, Some(403));
}

#[tokio::test]
async fn test_ssm_timeout_bounds_the_call() {
    let _ = env_logger::try_init();
    let sub = TestSubscriber::test_set_4d();
    let mock = MockSsm::start(
        MockResponse::plain(sub.ki_base64).with_delay(Duration::from_secs(5)),
    )
    .await
    .unwrap();
    let (service, _) = service_for(&mock, 200, &sub);

    let started = Instant::now();
    let err = service.unwrap(&ssm_request(&sub)).await.unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(matches!(err, CredentialError::Remote(ref p) if p.status == Some(403)));
}

/// A caller deadline shorter than the configured timeout wins
#[tokio::test]
async fn test_caller_deadline_bounds_the_call() -> anyhow::Result<()> {
    let _ = env_logger::try_init();
    let sub = TestSubscriber::test_set_4d();
    let mock = MockSsm::start(
        MockResponse::plain(sub.ki_base64).with_delay(Duration::from_secs(5)),
    )
    .await?;
    let (service, _) = service_for(&mock, 10_000, &sub);

    let started = Instant::now();
    let deadline = tokio::time::Instant::now() + Duration::from_millis(200);
    let err = service
        .unwrap_with_deadline(&ssm_request(&sub), Some(deadline))
        .await
        .unwrap_err();
    log::info!("Deadline expiry reported as {err}");

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(err.to_problem_details().cause.as_deref(), Some(AUTHENTICATION_REJECTED));
    assert_eq!(mock.requests().len(), 1);
    Ok(())
}

/// A caller deadline later than the configured timeout does not extend it
#[tokio::test]
async fn test_configured_timeout_caps_caller_deadline() -> anyhow::Result<()> {
    let _ = env_logger::try_init();
    let sub = TestSubscriber::test_set_4d();
    let mock = MockSsm::start(
        MockResponse::plain(sub.ki_base64).with_delay(Duration::from_secs(5)),
    )
    .await?;
    let (service, _) = service_for(&mock, 200, &sub);

    let started = Instant::now();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(30);
    let result = service
        .unwrap_with_deadline(&ssm_request(&sub), Some(deadline))
        .await;

    assert!(result.is_err());
    assert!(started.elapsed() < Duration::from_secs(3));
    Ok(())
}

/// A generous caller deadline still lets a prompt answer through
#[tokio::test]
async fn test_caller_deadline_allows_prompt_answer() -> anyhow::Result<()> {
    let _ = env_logger::try_init();
    let sub = TestSubscriber::key_128();
    let mock = MockSsm::start(MockResponse::plain(sub.ki_base64)).await?;
    let (service, _) = service_for(&mock, 3000, &sub);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    let ki = service
        .unwrap_with_deadline(&ssm_request(&sub), Some(deadline))
        .await?;
    assert_eq!(ki.as_str(), sub.ki_base64);
    Ok(())
}

#[tokio::test]
async fn test_ssm_unreachable() {
    let _ = env_logger::try_init();
    let sub = TestSubscriber::test_set_4d();
    let url = {
        let mock = MockSsm::start(MockResponse::plain(sub.ki_base64))
            .await
            .unwrap();
        mock.base_url().to_string()
    };
    // Give the accept loop a moment to exit and release the port
    tokio::time::sleep(Duration::from_millis(50)).await;

    let yaml = format!(
        "udm:\n  key_custodian: ssm\nssm:\n  host: \"{url}\"\n  timeout_ms: 1000\n  login:\n    service_id: udm\n    password: pw\n"
    );
    let config = UdmKeyConfig::from_yaml_str(&yaml).unwrap();
    let service = KeyUnwrapService::from_config(&config).unwrap();

    let err = service.unwrap(&ssm_request(&sub)).await.unwrap_err();
    assert_eq!(err.to_problem_details().cause.as_deref(), Some(AUTHENTICATION_REJECTED));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_ssm_unwraps() {
    let _ = env_logger::try_init();
    let sub = TestSubscriber::test_set_4d();
    let mock = MockSsm::start(MockResponse::plain(sub.ki_base64))
        .await
        .unwrap();
    let (service, _) = service_for(&mock, 3000, &sub);
    let service = Arc::new(service);

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let service = service.clone();
        let request = ssm_request(&sub);
        tasks.push(tokio::spawn(async move { service.unwrap(&request).await }));
    }

    for task in tasks {
        let ki = task.await.unwrap().unwrap();
        assert_eq!(ki.as_str(), sub.ki_base64);
    }
    assert_eq!(mock.requests().len(), 16);
}
