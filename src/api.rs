// Dropbox API client: a small blocking HTTP client for the two endpoints
// the uploader needs. The `StorageService` trait is the seam between the
// upload flow and the network, so the flow can be driven by a fake in tests.

use crate::config::Config;
use crate::error::ServiceError;
use log::debug;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

const API_ARG_HEADER: &str = "Dropbox-API-Arg";

/// The remote operations the uploader depends on.
pub trait StorageService {
    /// Look up the account the token belongs to.
    fn current_account(&self) -> Result<Account, ServiceError>;

    /// Store `contents` as described by `commit`.
    fn upload(&self, contents: Vec<u8>, commit: &CommitInfo) -> Result<FileMetadata, ServiceError>;
}

/// What to do when a file already exists at the destination. Only
/// replacing it is supported.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    Overwrite,
}

/// Arguments of `files/upload`, sent JSON-encoded in the `Dropbox-API-Arg`
/// header.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub path: String,
    pub mode: WriteMode,
    pub autorename: bool,
    pub mute: bool,
    pub strict_conflict: bool,
}

impl CommitInfo {
    /// Replace whatever is stored at `path`.
    pub fn overwrite(path: &str) -> Self {
        CommitInfo {
            path: path.to_string(),
            mode: WriteMode::Overwrite,
            autorename: false,
            mute: false,
            strict_conflict: false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Name {
    #[serde(default)]
    pub display_name: String,
}

/// Subset of the `users/get_current_account` response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub account_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Name,
}

/// Subset of the metadata returned by `files/upload`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub path_display: Option<String>,
    pub rev: String,
    pub size: u64,
    #[serde(default)]
    pub content_hash: Option<String>,
}

#[derive(Deserialize)]
struct UserMessage {
    text: String,
}

/// Error body Dropbox sends with 401/403/404/409/429 responses.
#[derive(Deserialize)]
struct ErrorEnvelope {
    error_summary: String,
    #[serde(default)]
    user_message: Option<UserMessage>,
}

/// Blocking Dropbox client bound to one access token. Its connections go
/// away with the inner `Client` when this is dropped.
pub struct DropboxClient {
    client: Client,
    api_url: String,
    content_url: String,
}

impl DropboxClient {
    /// Open a session for `token`. The token is not checked here; a token
    /// that cannot even be sent as a header is reported as rejected.
    pub fn new(token: &str, config: &Config) -> Result<Self, ServiceError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            ServiceError::Auth {
                summary: "access token contains characters not allowed in a header".into(),
            }
        })?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        // No total request timeout: the whole file goes up in one request.
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(None)
            .build()?;
        debug!("opened dropbox session");
        Ok(DropboxClient {
            client,
            api_url: config.api_url.clone(),
            content_url: config.content_url.clone(),
        })
    }
}

impl Drop for DropboxClient {
    fn drop(&mut self) {
        debug!("closing dropbox session");
    }
}

impl StorageService for DropboxClient {
    fn current_account(&self) -> Result<Account, ServiceError> {
        let url = format!("{}/2/users/get_current_account", &self.api_url);
        debug!("POST {}", url);
        let res = self.client.post(&url).send()?;
        let body = success_body(res)?;
        Ok(serde_json::from_str(&body)?)
    }

    fn upload(&self, contents: Vec<u8>, commit: &CommitInfo) -> Result<FileMetadata, ServiceError> {
        let url = format!("{}/2/files/upload", &self.content_url);
        let arg = HeaderValue::from_str(&api_arg(commit)?)
            .map_err(|e| ServiceError::BadInput(format!("{}: {}", API_ARG_HEADER, e)))?;
        debug!("POST {} ({} bytes)", url, contents.len());
        let res = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(API_ARG_HEADER, arg)
            .body(contents)
            .send()?;
        let body = success_body(res)?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Return the body of a 2xx response, or classify the failure.
fn success_body(res: Response) -> Result<String, ServiceError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res.text()?);
    }
    let retry_after = res
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok());
    let body = res.text().unwrap_or_default();
    debug!("dropbox answered {}: {}", status, body);
    Err(classify(status, retry_after, &body))
}

/// Map a non-2xx Dropbox response onto a `ServiceError`.
pub(crate) fn classify(status: StatusCode, retry_after: Option<u64>, body: &str) -> ServiceError {
    let envelope: Option<ErrorEnvelope> = serde_json::from_str(body).ok();
    let body = body.trim().to_string();
    let summary = envelope
        .as_ref()
        .map(|e| e.error_summary.clone())
        .unwrap_or_else(|| body.clone());

    match status.as_u16() {
        400 => ServiceError::BadInput(body),
        401 => ServiceError::Auth { summary },
        403 | 404 | 409 => ServiceError::Api {
            summary,
            user_message: envelope.and_then(|e| e.user_message).map(|m| m.text),
        },
        429 => ServiceError::RateLimit {
            summary,
            retry_after,
        },
        500..=599 => ServiceError::Internal { status, body },
        _ => ServiceError::Http { status, body },
    }
}

/// JSON for the `Dropbox-API-Arg` header. Header values must be ASCII, so
/// everything else is written as `\uXXXX` escapes.
pub(crate) fn api_arg(commit: &CommitInfo) -> Result<String, ServiceError> {
    let json = serde_json::to_string(commit)?;
    let mut out = String::with_capacity(json.len());
    let mut units = [0u16; 2];
    for ch in json.chars() {
        if ch.is_ascii() && ch != '\x7f' {
            out.push(ch);
        } else {
            for unit in ch.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    Ok(out)
}
