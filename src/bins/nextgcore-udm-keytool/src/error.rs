//! Credential error types

use ogs_crypt::key_unwrap::UnwrapError;
use ogs_crypt::milenage256::MilenageError;
use ogs_ssm::{ProblemDetails, AUTHENTICATION_REJECTED};
use thiserror::Error;

/// Failure to obtain or use a subscriber permanent key
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Local block cipher unwrap failed
    #[error(transparent)]
    Unwrap(#[from] UnwrapError),

    /// SSM decryption failed
    #[error("{0}")]
    Remote(ProblemDetails),

    /// No protecting key configured under the requested label
    #[error("Unknown protecting key label: {0}")]
    UnknownKeyLabel(String),

    /// Key material or vector input is not valid in its declared encoding
    #[error("Invalid {encoding} encoding of {field}: {reason}")]
    InvalidEncoding {
        field: &'static str,
        encoding: &'static str,
        reason: String,
    },

    /// Vector generation rejected its inputs
    #[error(transparent)]
    Milenage(#[from] MilenageError),
}

impl CredentialError {
    /// Uniform 403 problem report for every credential failure
    pub fn to_problem_details(&self) -> ProblemDetails {
        match self {
            Self::Remote(problem) => problem.clone(),
            other => ProblemDetails::with_status(403)
                .with_cause(AUTHENTICATION_REJECTED)
                .with_detail(format!("Failed to decrypt PermanentKey: {other}")),
        }
    }

    pub(crate) fn hex(field: &'static str, err: hex::FromHexError) -> Self {
        Self::InvalidEncoding {
            field,
            encoding: "hex",
            reason: err.to_string(),
        }
    }
}
