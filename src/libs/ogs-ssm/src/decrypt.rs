//! Remote permanent key decryption
//!
//! Both entry points return the SSM `plain` field verbatim on success. Any
//! failure (transport, deadline, non-2xx, malformed body) is logged and
//! reported as a 403 `AUTHENTICATION_REJECTED` problem.

use std::fmt::Display;
use std::future::Future;

use tokio::time::Instant;

use crate::client::SsmClient;
use crate::error::{SsmError, SsmResult};
use crate::message::{DecryptAesGcmRequest, DecryptRequest, DecryptResponse, ProblemDetails};

/// Problem cause reported for every decryption failure
pub const AUTHENTICATION_REJECTED: &str = "AUTHENTICATION_REJECTED";

/// Decrypt endpoint
pub const DECRYPT_PATH: &str = "/crypto/decrypt";
/// AES-GCM decrypt endpoint
pub const DECRYPT_AES_GCM_PATH: &str = "/crypto/decrypt-aes-gcm";

/// Build the problem report returned for a failed decryption
pub fn authentication_rejected(err: impl Display) -> ProblemDetails {
    ProblemDetails::with_status(403)
        .with_cause(AUTHENTICATION_REJECTED)
        .with_detail(format!("Failed to decrypt PermanentKey via SSM: {err}"))
}

/// Decrypt with a non-AEAD algorithm
pub async fn decrypt_plain(
    client: &SsmClient,
    request: &DecryptRequest,
    deadline: Option<Instant>,
) -> Result<String, ProblemDetails> {
    log::debug!(
        "SSM decrypt: key_label={} id={} algorithm={}",
        request.key_label,
        request.id,
        request.encryption_algorithm
    );
    let call = client.post_json::<_, DecryptResponse>(DECRYPT_PATH, request);
    finish(with_deadline(call, deadline).await)
}

/// Decrypt with AES-GCM, verifying `tag` over the ciphertext and `aad`
pub async fn decrypt_aead(
    client: &SsmClient,
    request: &DecryptAesGcmRequest,
    deadline: Option<Instant>,
) -> Result<String, ProblemDetails> {
    log::debug!(
        "SSM AES-GCM decrypt: key_label={} id={}",
        request.key_label,
        request.id
    );
    let call = client.post_json::<_, DecryptResponse>(DECRYPT_AES_GCM_PATH, request);
    finish(with_deadline(call, deadline).await)
}

async fn with_deadline<F>(call: F, deadline: Option<Instant>) -> SsmResult<DecryptResponse>
where
    F: Future<Output = SsmResult<DecryptResponse>>,
{
    match deadline {
        Some(at) => tokio::time::timeout_at(at, call)
            .await
            .unwrap_or(Err(SsmError::Timeout)),
        None => call.await,
    }
}

fn finish(result: SsmResult<DecryptResponse>) -> Result<String, ProblemDetails> {
    match result {
        Ok(resp) => Ok(resp.plain),
        Err(e) => {
            log::error!("SSM decryption failed: {e}");
            Err(authentication_rejected(e))
        }
    }
}
