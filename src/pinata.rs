// Pinata pinning gateway client. Small and blocking, like the rest of
// the crate: one request at a time, the caller waits for the answer.

use std::fmt;
use std::path::Path;

use reqwest::blocking::{multipart, Client};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::api::media_type_for;
use crate::config::{AppConfig, PinataAuth};
use crate::error::PublishError;

pub const PUBLIC_GATEWAY: &str = "https://gateway.pinata.cloud/ipfs/";

/// Identifier returned by the gateway for pinned content. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentId(String);

impl ContentId {
    /// Returns `None` for an empty (or whitespace-only) identifier.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(ContentId(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `ipfs://<cid>`
pub fn ipfs_uri(cid: &ContentId) -> String {
    format!("ipfs://{}", cid)
}

/// Public gateway URL for a CID.
pub fn gateway_url(cid: &ContentId) -> String {
    format!("{}{}", PUBLIC_GATEWAY, cid)
}

/// Authentication scheme chosen for a request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    KeyPair { api_key: String, secret_api_key: String },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Bearer(_) => f.write_str("Bearer(***)"),
            Credentials::KeyPair { .. } => f.write_str("KeyPair(***)"),
        }
    }
}

impl Credentials {
    /// Prefer the bearer token, then a complete key pair. Anything else
    /// is `MissingCredentials`.
    /// Empty strings count as unset.
    pub fn resolve(auth: &PinataAuth) -> Result<Self, PublishError> {
        let set = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
        if let Some(jwt) = set(&auth.jwt) {
            return Ok(Credentials::Bearer(jwt));
        }
        match (set(&auth.api_key), set(&auth.secret_api_key)) {
            (Some(api_key), Some(secret_api_key)) => Ok(Credentials::KeyPair {
                api_key,
                secret_api_key,
            }),
            _ => Err(PublishError::MissingCredentials),
        }
    }

    pub fn headers(&self) -> Result<HeaderMap, PublishError> {
        let mut headers = HeaderMap::new();
        match self {
            Credentials::Bearer(token) => {
                headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", token))?);
            }
            Credentials::KeyPair { api_key, secret_api_key } => {
                headers.insert(
                    HeaderName::from_static("pinata_api_key"),
                    HeaderValue::from_str(api_key)?,
                );
                headers.insert(
                    HeaderName::from_static("pinata_secret_api_key"),
                    HeaderValue::from_str(secret_api_key)?,
                );
            }
        }
        Ok(headers)
    }
}

/// Something that can pin a local file and hand back its CID.
///
/// `Ok(None)` means the gateway refused the upload or could not be
/// reached; the caller decides what that means for its own flow. `Err`
/// is reserved for problems that should abort outright (missing
/// credentials, unreadable file, garbage response body).
pub trait PinningGateway {
    fn pin_file(&self, path: &Path, name: &str) -> Result<Option<ContentId>, PublishError>;
}

impl<G: PinningGateway + ?Sized> PinningGateway for &G {
    fn pin_file(&self, path: &Path, name: &str) -> Result<Option<ContentId>, PublishError> {
        (**self).pin_file(path, name)
    }
}

/// Body of a successful `pinFileToIPFS` call.
#[derive(Debug, Deserialize)]
pub struct PinResponse {
    #[serde(rename = "IpfsHash")]
    pub ipfs_hash: Option<String>,
    #[serde(rename = "PinSize")]
    pub pin_size: Option<u64>,
    #[serde(rename = "Timestamp")]
    pub timestamp: Option<String>,
}

/// One row of `GET /data/pinList`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PinnedFile {
    pub id: String,
    pub ipfs_pin_hash: String,
    pub size: u64,
    pub date_pinned: Option<String>,
    pub metadata: PinMetadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PinMetadata {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PinListResponse {
    count: Option<u64>,
    #[serde(default)]
    rows: Vec<PinnedFile>,
}

#[derive(Debug, Deserialize)]
struct AuthCheckResponse {
    message: Option<String>,
}

/// Blocking Pinata client. Credentials are stored as configured and only
/// resolved when a request is about to be sent.
#[derive(Clone)]
pub struct PinataClient {
    client: Client,
    base_url: String,
    auth: PinataAuth,
}

impl PinataClient {
    pub fn new(base_url: impl Into<String>, auth: PinataAuth) -> Result<Self, PublishError> {
        let client = Client::builder().build()?;
        Ok(Self::with_http_client(client, base_url, auth))
    }

    /// Use an already configured `reqwest` client (proxy, TLS, timeouts).
    pub fn with_http_client(client: Client, base_url: impl Into<String>, auth: PinataAuth) -> Self {
        PinataClient {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Result<Self, PublishError> {
        Self::new(cfg.pinata_base_url.clone(), cfg.pinata_auth.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, PublishError> {
        let headers = Credentials::resolve(&self.auth)?.headers()?;
        let url = format!("{}{}", self.base_url, path);
        tracing::info!("GET {}", url);

        let res = self.client.get(&url).headers(headers).query(query).send()?;
        let status = res.status();
        let body = res.text()?;
        if !status.is_success() {
            tracing::error!("Error from Pinata API: {} - {}", status, body);
            return Err(PublishError::GatewayRejected { status: status.as_u16(), body });
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Ask the gateway whether the configured credentials are accepted.
    /// Returns the gateway's greeting on success.
    pub fn test_authentication(&self) -> Result<String, PublishError> {
        let parsed: AuthCheckResponse = self.get_json("/data/testAuthentication", &[])?;
        Ok(parsed.message.unwrap_or_else(|| "Authenticated".into()))
    }

    /// First page (up to 100) of content currently pinned by this account.
    pub fn list_pins(&self) -> Result<Vec<PinnedFile>, PublishError> {
        let parsed: PinListResponse =
            self.get_json("/data/pinList", &[("status", "pinned"), ("pageLimit", "100")])?;
        tracing::debug!("Pinata reports {:?} pins, {} on this page", parsed.count, parsed.rows.len());
        Ok(parsed.rows)
    }

    fn build_form(path: &Path, name: &str) -> Result<multipart::Form, PublishError> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(media_type_for(path))?;

        Ok(multipart::Form::new()
            .part("file", part)
            .text("pinataMetadata", json!({ "name": name }).to_string())
            .text("pinataOptions", json!({ "cidVersion": 0 }).to_string()))
    }
}

impl PinningGateway for PinataClient {
    fn pin_file(&self, path: &Path, name: &str) -> Result<Option<ContentId>, PublishError> {
        // Credentials first: nothing leaves the machine without them.
        let headers = Credentials::resolve(&self.auth)?.headers()?;
        let form = Self::build_form(path, name)?;
        let url = format!("{}/pinning/pinFileToIPFS", self.base_url);
        tracing::info!("Pinning {} to IPFS as `{}`", path.display(), name);

        let res = match self.client.post(&url).headers(headers).multipart(form).send() {
            Ok(res) => res,
            Err(e) => {
                tracing::error!("Error while uploading to IPFS: {}", e);
                return Ok(None);
            }
        };

        let status = res.status();
        let body = match res.text() {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Error reading Pinata response: {}", e);
                return Ok(None);
            }
        };
        if !status.is_success() {
            tracing::error!("Error from Pinata API: {} - {}", status, body);
            return Ok(None);
        }

        let parsed: PinResponse = serde_json::from_str(&body).map_err(|e| {
            PublishError::MalformedResponse(format!("{} (body: {})", e, body))
        })?;
        tracing::debug!(
            "Pinata upload successful: size={:?} timestamp={:?}",
            parsed.pin_size,
            parsed.timestamp
        );
        Ok(parsed.ipfs_hash.and_then(|hash| ContentId::new(hash)))
    }
}
