use std::fmt;
use std::time::Duration;

use http::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::Deserialize;
use url::Url;

use crate::config::OpsConfig;
use crate::error::OpsError;
use crate::xml::CanonicalValue;

use super::response_decoder::decode;

const ACCEPT_XML: &str = "application/xml";
const ACCEPT_JSON: &str = "application/json";
const GRANT_TYPE_FORM: [(&str, &str); 1] = [("grant_type", "client_credentials")];
const ERROR_BODY_PREVIEW_CHARS: usize = 300;

/// Opaque bearer token. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// A resource request: path segments below the base URL plus query pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpsRequest {
    segments: Vec<String>,
    query: Vec<(String, String)>,
}

impl OpsRequest {
    /// Build a request from `/`-separated path pieces. Each piece may itself
    /// contain `/`, which is kept as a separator; everything else is
    /// percent-encoded when the URL is built.
    #[must_use]
    pub fn new<I, S>(pieces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let segments = pieces
            .into_iter()
            .flat_map(|piece| {
                piece
                    .as_ref()
                    .split('/')
                    .filter(|segment| !segment.is_empty())
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();
        Self {
            segments,
            query: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Endpoint path as sent below the base URL, e.g. `/published-data/search`.
    #[must_use]
    pub fn endpoint(&self) -> String {
        let mut endpoint = String::new();
        for segment in &self.segments {
            endpoint.push('/');
            endpoint.push_str(segment);
        }
        endpoint
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// HTTP client for the OPS REST API.
///
/// Owns one `reqwest` connection pool. The pool is released when the client
/// is dropped; attaching a credential consumes the client and builds a new one.
pub struct OpsClient {
    http: reqwest::Client,
    config: OpsConfig,
    base_url: Url,
    credential: Option<Credential>,
}

impl fmt::Debug for OpsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpsClient")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.credential.is_some())
            .finish_non_exhaustive()
    }
}

fn default_headers(
    config: &OpsConfig,
    credential: Option<&Credential>,
) -> Result<HeaderMap, OpsError> {
    let mut headers = HeaderMap::with_capacity(3);
    let user_agent = HeaderValue::from_str(&config.user_agent)
        .map_err(|err| OpsError::Config(format!("Invalid user agent: {err}")))?;
    headers.insert(USER_AGENT, user_agent);
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_XML));
    if let Some(credential) = credential {
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", credential.as_str()))
            .map_err(|_| {
                OpsError::Auth("access token contains invalid header characters".into())
            })?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
    }
    Ok(headers)
}

fn build_reqwest_client(
    config: &OpsConfig,
    credential: Option<&Credential>,
) -> Result<reqwest::Client, OpsError> {
    let mut builder = reqwest::Client::builder()
        .default_headers(default_headers(config, credential)?)
        .connect_timeout(Duration::from_secs(config.connect_timeout))
        .timeout(Duration::from_secs(config.timeout));

    if !config.use_env_proxy {
        builder = builder.no_proxy();
    }

    builder
        .build()
        .map_err(|err| OpsError::Internal(format!("Failed to build HTTP client: {err}")))
}

fn body_preview(body: &str) -> String {
    let trimmed = body.trim();
    let mut preview: String = trimmed.chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
    if trimmed.chars().nth(ERROR_BODY_PREVIEW_CHARS).is_some() {
        preview.push_str("...");
    }
    preview
}

impl OpsClient {
    /// Create an unauthenticated client.
    ///
    /// # Errors
    ///
    /// Returns [`OpsError::Config`] for an unusable base URL or user agent and
    /// [`OpsError::Internal`] when the HTTP client cannot be built.
    pub fn new(config: &OpsConfig) -> Result<Self, OpsError> {
        Self::build(config.clone(), None)
    }

    fn build(config: OpsConfig, credential: Option<Credential>) -> Result<Self, OpsError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|err| OpsError::Config(format!("Invalid base URL: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(OpsError::Config(format!(
                "Base URL cannot carry a path: {base_url}"
            )));
        }
        let http = build_reqwest_client(&config, credential.as_ref())?;
        Ok(Self {
            http,
            config,
            base_url,
            credential,
        })
    }

    /// Replace this client with one that sends `Authorization: Bearer <token>`.
    ///
    /// # Errors
    ///
    /// Returns [`OpsError::Auth`] when the token cannot be used as a header value.
    pub fn with_credential(self, credential: Credential) -> Result<Self, OpsError> {
        let Self { http, config, .. } = self;
        drop(http);
        Self::build(config, Some(credential))
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    /// Exchange consumer key/secret for an access token (OAuth2 client credentials).
    ///
    /// # Errors
    ///
    /// Returns [`OpsError::Auth`] on transport failure, a non-2xx status, or a
    /// response without a usable `access_token`.
    pub async fn acquire_token(&self, key: &str, secret: &str) -> Result<Credential, OpsError> {
        let auth_url = self.config.auth_url.as_str();
        let response = self
            .http
            .post(auth_url)
            .basic_auth(key, Some(secret))
            .header(ACCEPT, ACCEPT_JSON)
            .form(&GRANT_TYPE_FORM)
            .send()
            .await
            .map_err(|err| OpsError::Auth(format!("token request to {auth_url} failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OpsError::Auth(format!(
                "token exchange rejected: status={status}, body={}",
                body_preview(&body)
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| OpsError::Auth(format!("failed to read token response: {err}")))?;
        let token: TokenResponse = serde_json::from_slice(&body)
            .map_err(|err| OpsError::Auth(format!("invalid token response: {err}")))?;
        if token.access_token.trim().is_empty() {
            return Err(OpsError::Auth(
                "token response carried an empty access_token".into(),
            ));
        }
        Ok(Credential::new(token.access_token))
    }

    fn request_url(&self, request: &OpsRequest) -> Result<Url, OpsError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                OpsError::Internal(format!("Base URL cannot carry a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(request.segments());
        Ok(url)
    }

    /// GET a resource below the base URL and decode the body.
    ///
    /// # Errors
    ///
    /// Returns [`OpsError::Request`] on transport failure or a non-2xx status.
    pub async fn fetch(&self, request: &OpsRequest) -> Result<CanonicalValue, OpsError> {
        let url = self.request_url(request)?;
        tracing::debug!(url = %url, query = ?request.query(), "OPS request");

        let response = self
            .http
            .get(url.clone())
            .query(request.query())
            .send()
            .await
            .map_err(|err| OpsError::Request(format!("request to {url} failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OpsError::Request(format!(
                "request to {url} failed: status={status}, body={}",
                body_preview(&body)
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);
        let body = response
            .text()
            .await
            .map_err(|err| OpsError::Request(format!("failed to read body from {url}: {err}")))?;

        tracing::debug!(url = %url, status = %status, bytes = body.len(), "OPS response");
        Ok(decode(&body, content_type.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_endpoint_rendering() {
        let request = OpsRequest::new([
            "published-data",
            "publication",
            "epodoc",
            "EP1000000",
            "biblio",
        ]);
        assert_eq!(
            request.endpoint(),
            "/published-data/publication/epodoc/EP1000000/biblio"
        );
        assert!(request.query().is_empty());
    }

    #[test]
    fn test_request_splits_embedded_slashes() {
        let request = OpsRequest::new(["classification/cpc", "A01B1/00"]);
        assert_eq!(request.segments(), ["classification", "cpc", "A01B1", "00"]);
    }

    #[test]
    fn test_request_url_encodes_segments() {
        let client = OpsClient::new(&OpsConfig::default()).unwrap();
        let request = OpsRequest::new(["number-service", "US 123?x"]).with_query("q", "ti=a b");
        let url = client.request_url(&request).unwrap();
        assert_eq!(
            url.as_str(),
            "https://ops.epo.org/3.2/rest-services/number-service/US%20123%3Fx"
        );
    }

    #[test]
    fn test_default_headers_with_credential() {
        let headers =
            default_headers(&OpsConfig::default(), Some(&Credential::new("tok"))).unwrap();
        assert_eq!(headers[ACCEPT], "application/xml");
        assert_eq!(headers[USER_AGENT], "ops-mcp-server/1.0");
        assert_eq!(headers[AUTHORIZATION], "Bearer tok");
        assert!(headers[AUTHORIZATION].is_sensitive());

        let headers = default_headers(&OpsConfig::default(), None).unwrap();
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_invalid_token_header_is_auth_error() {
        let err = default_headers(&OpsConfig::default(), Some(&Credential::new("bad\ntoken")))
            .unwrap_err();
        assert!(matches!(err, OpsError::Auth(_)));
    }

    #[test]
    fn test_with_credential_rebuilds_client() {
        let client = OpsClient::new(&OpsConfig::default()).unwrap();
        assert!(!client.is_authenticated());
        let client = client.with_credential(Credential::new("tok")).unwrap();
        assert!(client.is_authenticated());
        assert!(!format!("{client:?}").contains("tok"));
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        assert_eq!(
            format!("{:?}", Credential::new("secret")),
            "Credential(<redacted>)"
        );
    }

    #[test]
    fn test_body_preview_truncates() {
        let long = "x".repeat(ERROR_BODY_PREVIEW_CHARS + 10);
        let preview = body_preview(&long);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.len(), ERROR_BODY_PREVIEW_CHARS + 3);
        assert_eq!(body_preview("  short "), "short");
    }
}
