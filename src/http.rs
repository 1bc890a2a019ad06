//! Shared HTTP plumbing for the source lister and provider adapters
//!
//! Every API call goes through [`send`], which logs the exchange and hands the
//! fully buffered body back to the caller. Adapters never touch the transport.

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use url::Url;

use crate::error::{MirrorError, Result};

/// Build the HTTP client shared by every component for one run
pub fn new_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .user_agent(user_agent())
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// GitHub rejects API requests without a User-Agent
pub fn user_agent() -> String {
    format!("repomirror/{}", env!("CARGO_PKG_VERSION"))
}

/// A response whose body has already been read
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Turn a non-2xx response into a provider error
    pub fn into_provider_error(self, provider: &'static str) -> MirrorError {
        MirrorError::ProviderApi {
            provider,
            status: self.status.as_u16(),
            body: self.body,
        }
    }
}

/// Send a request, log it, and return the buffered response
pub async fn send(client: &Client, request: RequestBuilder) -> Result<ApiResponse> {
    let request = request.build()?;
    let method = request.method().clone();
    let url = request.url().clone();

    if let Some(body) = request.body().and_then(|b| b.as_bytes()) {
        trace!("Request body ({} {}): {}", method, url, String::from_utf8_lossy(body));
    }

    let started = Instant::now();
    let response = client.execute(request).await?;
    let status = response.status();
    let body = response.text().await?;

    debug!(
        "{} {} -> {} ({} ms)",
        method,
        url,
        status.as_u16(),
        started.elapsed().as_millis()
    );
    if body.is_empty() {
        trace!("Response body ({} {} -> {}): <empty>", method, url, status.as_u16());
    } else {
        trace!("Response body ({} {} -> {}): {}", method, url, status.as_u16(), body);
    }

    Ok(ApiResponse { status, body })
}

/// Parse a configured base URL, keeping any path prefix (e.g. `/api/v4`)
pub fn parse_base(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim_end_matches('/'))?;
    if url.cannot_be_a_base() {
        return Err(MirrorError::Url(format!("{} cannot be used as a base URL", raw)));
    }
    Ok(url)
}

/// Append path segments to a base URL, percent-encoding each one
///
/// A segment containing `/` is encoded as `%2F`, which is what GitLab expects
/// for `namespace/project` identifiers.
pub fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| MirrorError::Url(format!("{} cannot be used as a base URL", base)))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}

/// Build `https://<user>:<secret>@<host>/<segments...>` from a web base URL
pub fn credential_url(base: &Url, username: &str, secret: &str, segments: &[&str]) -> Result<String> {
    let mut url = endpoint(base, segments)?;
    url.set_username(username)
        .map_err(|_| MirrorError::Url(format!("cannot set credentials on {}", base)))?;
    url.set_password(Some(secret))
        .map_err(|_| MirrorError::Url(format!("cannot set credentials on {}", base)))?;
    Ok(url.to_string())
}
