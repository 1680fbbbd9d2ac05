//! HTTP transport for the file share REST API
//!
//! [`ServiceClient`] builds request URLs against the file endpoint, stamps the
//! version header, has [`RequestSigner`] authorize the request and turns
//! unsuccessful responses into [`AzstoreError::ServiceError`].

use crate::auth::RequestSigner;
use crate::config::{NetworkSettings, StorageAccount, StorageService};
use crate::error::{AzstoreError, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_LENGTH};
use reqwest::{Client, Method, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const X_MS_VERSION: &str = "x-ms-version";
const X_MS_ERROR_CODE: &str = "x-ms-error-code";

/// REST API version sent with every request
const STORAGE_API_VERSION: &str = "2022-11-02";

/// Configuration for HTTP client with proper timeouts
pub struct NetworkConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::from(&NetworkSettings::default())
    }
}

impl From<&NetworkSettings> for NetworkConfig {
    fn from(settings: &NetworkSettings) -> Self {
        Self {
            connect_timeout: Duration::from_secs(settings.connect_timeout_secs),
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
            user_agent: format!("azstore/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Create a properly configured HTTP client with timeouts
pub fn create_http_client(config: &NetworkConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| AzstoreError::network(format!("Failed to create HTTP client: {e}")))
}

/// Network error classification with messages naming the endpoint
pub fn classify_network_error(error: reqwest::Error, url: &Url) -> AzstoreError {
    let host = url.host_str().unwrap_or("unknown-host");

    if error.is_timeout() {
        return AzstoreError::network(format!(
            "Request to storage endpoint '{host}' timed out"
        ));
    }

    if error.is_connect() {
        let message = error.to_string().to_lowercase();
        if message.contains("dns") || message.contains("resolve") || message.contains("lookup") {
            return AzstoreError::network(format!(
                "Unable to resolve storage endpoint '{host}'. Check the account name in the connection string"
            ));
        }
        return AzstoreError::network(format!(
            "Failed to connect to storage endpoint '{host}'"
        ));
    }

    // the URL may carry a SAS signature
    AzstoreError::HttpError(error.without_url())
}

/// REST client bound to a single storage service endpoint
#[derive(Clone)]
pub struct ServiceClient {
    http: Client,
    service: StorageService,
    endpoint: Url,
    signer: Arc<RequestSigner>,
}

impl std::fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceClient")
            .field("service", &self.service)
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl ServiceClient {
    pub fn new(account: &StorageAccount, service: StorageService, http: Client) -> Result<Self> {
        let endpoint = account.require_endpoint(service)?.clone();

        Ok(Self {
            http,
            service,
            endpoint,
            signer: Arc::new(RequestSigner::new(account)),
        })
    }

    /// Endpoint URL extended by path segments; each segment is percent-encoded.
    pub fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.endpoint.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                AzstoreError::config(format!("Endpoint '{}' cannot carry a path", self.endpoint))
            })?;
            path.pop_if_empty();
            for segment in segments.iter().filter(|s| !s.is_empty()) {
                path.push(segment);
            }
        }
        Ok(url)
    }

    /// Send a request and return the response whatever its status.
    pub async fn send(
        &self,
        method: Method,
        url: Url,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<Response> {
        tracing::trace!("{} {} {}", self.service, method, url.path());

        let body = body.unwrap_or_default();
        let length = body.len();
        let mut request = http::Request::builder()
            .method(method)
            .uri(url.as_str())
            .body(body)
            .map_err(|e| AzstoreError::invalid_argument(format!("Invalid request: {e}")))?;

        let request_headers = request.headers_mut();
        request_headers.extend(headers);
        request_headers.insert(X_MS_VERSION, HeaderValue::from_static(STORAGE_API_VERSION));
        // signed, so it must be present before signing
        if length > 0 {
            request_headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
        }

        self.signer.sign(&mut request).await?;
        let request = reqwest::Request::try_from(request)?;

        self.http
            .execute(request)
            .await
            .map_err(|e| classify_network_error(e, &url))
    }

    /// Send a request and fail on any non-success status.
    pub async fn send_checked(
        &self,
        method: Method,
        url: Url,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<Response> {
        let response = self.send(method, url, headers, body).await?;
        check_response(response).await
    }

    /// Probe a resource: success means it exists, 404 means it does not.
    pub async fn exists(&self, method: Method, url: Url, headers: HeaderMap) -> Result<bool> {
        let response = self.send(method, url, headers, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check_response(response).await.map(|_| true)
    }
}

/// Turn a non-success response into a service error.
pub async fn check_response(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    Err(service_error(response).await)
}

pub async fn service_error(response: Response) -> AzstoreError {
    let status = response.status();
    let code = response
        .headers()
        .get(X_MS_ERROR_CODE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "request failed".to_string());

    AzstoreError::ServiceError {
        status: status.as_u16(),
        code,
        message,
    }
}

/// Pull the human readable message out of an XML error body
pub(crate) fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    let start = trimmed.find("<Message>")? + "<Message>".len();
    let end = trimmed[start..].find("</Message>")? + start;
    let message = &trimmed[start..end];
    Some(message.lines().next().unwrap_or(message).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(connection: &str, service: StorageService) -> ServiceClient {
        let account = StorageAccount::parse(connection).unwrap();
        ServiceClient::new(&account, service, Client::new()).unwrap()
    }

    #[test]
    fn test_url_encodes_segments() {
        let client = client(
            "AccountName=acct;AccountKey=a2V5LWZvci10ZXN0cw==",
            StorageService::File,
        );
        let url = client.url(&["share", "dir one", "a#b.txt"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://acct.file.core.windows.net/share/dir%20one/a%23b.txt"
        );
    }

    #[test]
    fn test_url_keeps_custom_endpoint_path() {
        let client = client(
            "AccountName=acct;AccountKey=a2V5LWZvci10ZXN0cw==;FileEndpoint=http://127.0.0.1:10004/acct",
            StorageService::File,
        );
        let url = client.url(&["docs", "reports"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:10004/acct/docs/reports");
    }

    #[test]
    fn test_missing_endpoint_is_config_error() {
        let account = StorageAccount::parse("UseDevelopmentStorage=true").unwrap();
        let err = ServiceClient::new(&account, StorageService::File, Client::new()).unwrap_err();
        assert!(matches!(err, AzstoreError::ConfigError(_)));
    }

    #[test]
    fn test_error_message_extraction() {
        let xml = "<?xml version=\"1.0\" encoding=\"utf-8\"?><Error><Code>ShareNotFound</Code><Message>The specified share does not exist.\nRequestId:abc</Message></Error>";
        assert_eq!(
            error_message(xml).as_deref(),
            Some("The specified share does not exist.")
        );

        assert_eq!(error_message(""), None);
        assert_eq!(error_message("<Error><Code>X</Code></Error>"), None);
    }
}
