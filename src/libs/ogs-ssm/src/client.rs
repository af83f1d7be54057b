//! SSM HTTP Client
//!
//! HTTP/1.1 client (optionally over TLS or mTLS) for the Secure Storage
//! Module REST API. The TLS connector and the authorization header are
//! built once in [`SsmClient::new`]; the client is immutable afterwards
//! and is shared as `Arc<SsmClient>`. Every request uses its own
//! connection.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1::SendRequest;
use hyper::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HOST};
use hyper::{Method, Request, Uri};
use hyper_util::rt::TokioIo;
use rustls::pki_types::ServerName;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use zeroize::Zeroizing;

use crate::error::{SsmError, SsmResult};
use crate::login::SsmCredentials;
use crate::tls;

/// Default connection timeout in seconds
const DEFAULT_CONNECT_TIMEOUT: u64 = 5;
/// Default request timeout in seconds
const DEFAULT_REQUEST_TIMEOUT: u64 = 30;

/// SSM client configuration
#[derive(Debug, Clone)]
pub struct SsmClientConfig {
    /// Base URL of the SSM, e.g. `https://ssm.local:9443`
    pub base_url: String,
    /// Connection timeout (TCP connect and TLS handshake)
    pub connect_timeout: Duration,
    /// Request timeout (send and read the full response)
    pub request_timeout: Duration,
    /// Skip TLS verification (for testing)
    pub insecure_skip_verify: bool,
    /// CA certificate path
    pub ca_cert: Option<String>,
    /// Client certificate path
    pub client_cert: Option<String>,
    /// Client private key path
    pub client_key: Option<String>,
    /// Login presented as HTTP Basic authorization
    pub credentials: Option<SsmCredentials>,
}

impl Default for SsmClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT),
            insecure_skip_verify: false,
            ca_cert: None,
            client_cert: None,
            client_key: None,
            credentials: None,
        }
    }
}

impl SsmClientConfig {
    /// Create a new client configuration
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Disable server certificate verification
    pub fn with_insecure_skip_verify(mut self, insecure: bool) -> Self {
        self.insecure_skip_verify = insecure;
        self
    }

    /// Present a client certificate and trust the given CA bundle
    pub fn with_mtls(
        mut self,
        client_cert: impl Into<String>,
        client_key: impl Into<String>,
        ca_cert: impl Into<String>,
    ) -> Self {
        self.client_cert = Some(client_cert.into());
        self.client_key = Some(client_key.into());
        self.ca_cert = Some(ca_cert.into());
        self
    }

    /// Set login credentials
    pub fn with_credentials(mut self, credentials: SsmCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scheme {
    Http,
    Https,
}

/// SSM client
pub struct SsmClient {
    config: SsmClientConfig,
    scheme: Scheme,
    host: String,
    port: u16,
    base_path: String,
    tls: Option<TlsConnector>,
    authorization: Option<Zeroizing<String>>,
}

impl SsmClient {
    /// Create a new SSM client
    ///
    /// Parses the base URL and, for `https`, builds the TLS connector
    /// (with client authentication when both certificate and key are set).
    pub fn new(config: SsmClientConfig) -> SsmResult<Self> {
        let uri: Uri = config
            .base_url
            .parse()
            .map_err(|e| SsmError::InvalidUri(format!("{}: {e}", config.base_url)))?;

        let scheme = match uri.scheme_str() {
            Some("http") => Scheme::Http,
            Some("https") => Scheme::Https,
            other => {
                return Err(SsmError::InvalidUri(format!(
                    "{}: unsupported scheme {:?}",
                    config.base_url, other
                )))
            }
        };
        let host = uri
            .host()
            .ok_or_else(|| SsmError::InvalidUri(format!("{}: missing host", config.base_url)))?
            .to_string();
        let port = uri.port_u16().unwrap_or(match scheme {
            Scheme::Http => 80,
            Scheme::Https => 443,
        });
        let base_path = uri.path().trim_end_matches('/').to_string();

        let tls = match scheme {
            Scheme::Https => Some(build_tls_connector(&config)?),
            Scheme::Http => None,
        };
        let authorization = config
            .credentials
            .as_ref()
            .map(SsmCredentials::basic_authorization);

        log::info!(
            "SSM client created for {} (tls={}, mtls={})",
            config.base_url,
            tls.is_some(),
            config.client_cert.is_some() && config.client_key.is_some()
        );

        Ok(Self {
            config,
            scheme,
            host,
            port,
            base_path,
            tls,
            authorization,
        })
    }

    /// Get the client configuration
    pub fn config(&self) -> &SsmClientConfig {
        &self.config
    }

    fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Open a fresh connection to the SSM
    async fn connect(&self) -> SsmResult<SendRequest<Full<Bytes>>> {
        let addr = self.authority();

        let stream = tokio::time::timeout(self.config.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| SsmError::Timeout)?
            .map_err(|e| SsmError::ConnectionError(format!("{addr}: {e}")))?;

        match (&self.tls, self.scheme) {
            (Some(connector), Scheme::Https) => {
                let name = self.host.trim_start_matches('[').trim_end_matches(']').to_string();
                let server_name = ServerName::try_from(name)
                    .map_err(|e| SsmError::TlsError(format!("Invalid server name: {e}")))?;

                let tls_stream = tokio::time::timeout(
                    self.config.connect_timeout,
                    connector.connect(server_name, stream),
                )
                .await
                .map_err(|_| SsmError::Timeout)?
                .map_err(|e| SsmError::TlsError(format!("TLS handshake failed: {e}")))?;

                handshake(TokioIo::new(tls_stream)).await
            }
            _ => handshake(TokioIo::new(stream)).await,
        }
    }

    /// POST a JSON body to `path` and decode the JSON response
    pub async fn post_json<T, R>(&self, path: &str, body: &T) -> SsmResult<R>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let payload = serde_json::to_vec(body)?;

        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(format!("{}{}", self.base_path, path))
            .header(HOST, self.authority())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        if let Some(auth) = &self.authorization {
            builder = builder.header(AUTHORIZATION, auth.as_str());
        }
        let request = builder
            .body(Full::new(Bytes::from(payload)))
            .map_err(|e| SsmError::InvalidUri(e.to_string()))?;

        let (status, bytes) = tokio::time::timeout(self.config.request_timeout, self.exchange(request))
            .await
            .map_err(|_| SsmError::Timeout)??;

        if !(200..300).contains(&status) {
            return Err(SsmError::from_status(
                status,
                String::from_utf8_lossy(&bytes).trim().to_string(),
            ));
        }

        serde_json::from_slice(&bytes).map_err(|e| SsmError::InvalidResponse(e.to_string()))
    }

    async fn exchange(&self, request: Request<Full<Bytes>>) -> SsmResult<(u16, Bytes)> {
        let mut sender = self.connect().await?;

        let response = sender
            .send_request(request)
            .await
            .map_err(|e| SsmError::HyperError(e.to_string()))?;
        let status = response.status().as_u16();

        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| SsmError::InvalidResponse(e.to_string()))?
            .to_bytes();

        Ok((status, bytes))
    }
}

impl std::fmt::Debug for SsmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsmClient")
            .field("base_url", &self.config.base_url)
            .field("tls", &self.tls.is_some())
            .finish()
    }
}

/// Build a TLS connector from the client config
fn build_tls_connector(config: &SsmClientConfig) -> SsmResult<TlsConnector> {
    let identity = match (&config.client_cert, &config.client_key) {
        (Some(cert_path), Some(key_path)) => {
            log::info!("Configuring mTLS for SSM client");
            Some((tls::load_certs(cert_path)?, tls::load_private_key(key_path)?))
        }
        _ => None,
    };

    let client_config = tls::build_client_config(
        config.ca_cert.as_deref(),
        identity,
        config.insecure_skip_verify,
    )?;

    Ok(TlsConnector::from(Arc::new(client_config)))
}

async fn handshake<I>(io: I) -> SsmResult<SendRequest<Full<Bytes>>>
where
    I: hyper::rt::Read + hyper::rt::Write + Unpin + Send + 'static,
{
    let (sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|e| SsmError::ConnectionError(e.to_string()))?;

    tokio::spawn(async move {
        if let Err(e) = conn.await {
            log::debug!("SSM connection closed: {e}");
        }
    });

    Ok(sender)
}
