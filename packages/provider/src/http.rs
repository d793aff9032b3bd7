//! Response handling shared by every adapter.

use reqwest::{RequestBuilder, Response};
use scmbridge_provider_models::{Credentials, Provider};
use serde::de::DeserializeOwned;

use crate::{Result, ScmError};

pub const USER_AGENT: &str = "scmbridge";

/// Upper bound on pages fetched by a single listing call.
pub const MAX_PAGES: usize = 1000;

const MAX_ERROR_BODY: usize = 1024;

/// Builds the default client every adapter starts from.
///
/// # Panics
///
/// * If the `reqwest::Client` fails to build
#[must_use]
pub fn default_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .unwrap()
}

/// Attaches `Authorization` for providers that accept either a bearer token
/// or basic auth.
#[must_use]
pub fn bearer_or_basic(request: RequestBuilder, credentials: &Credentials) -> RequestBuilder {
    match credentials {
        Credentials::None => request,
        Credentials::Token { token } => request.bearer_auth(token),
        Credentials::Basic { username, password } => request.basic_auth(username, Some(password)),
    }
}

/// Passes 2xx responses through and turns everything else into
/// [`ScmError::Api`], keeping a prefix of the body for diagnostics.
///
/// # Errors
///
/// * [`ScmError::Api`] if the status is not a success
pub async fn ensure_success(provider: Provider, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    log::error!("{provider} API error: {status}: {body}");

    Err(ScmError::Api {
        provider,
        status: status.as_u16(),
        message: truncate(body),
    })
}

/// # Errors
///
/// * If the status is not a success
/// * If the body cannot be read or does not deserialize into `T`
pub async fn read_json<T: DeserializeOwned>(provider: Provider, response: Response) -> Result<T> {
    let response = ensure_success(provider, response).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// # Errors
///
/// * If the status is not a success
/// * If the body cannot be read
pub async fn read_bytes(provider: Provider, response: Response) -> Result<Vec<u8>> {
    let response = ensure_success(provider, response).await?;
    Ok(response.bytes().await?.to_vec())
}

/// # Errors
///
/// * If the status is not a success
pub async fn read_empty(provider: Provider, response: Response) -> Result<()> {
    ensure_success(provider, response).await?;
    Ok(())
}

/// Percent-encodes each segment of a repository path, keeping the `/`
/// separators, for providers that take the path as part of the URL.
#[must_use]
pub fn encode_path(path: &str) -> String {
    path.trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}
