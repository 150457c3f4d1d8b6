//! HTTP client for the hosted content provider
//!
//! A single attempt is made per call; there is no retry and no redirect
//! following, so upstream 3xx responses reach the client untouched.

use crate::config::SiteConfig;
use crate::error::{ProxyError, Result};
use crate::response::HOP_BY_HOP_HEADERS;
use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderValue};
use http::Method;
use reqwest::{redirect, Client, Response, Url};
use tracing::{debug, warn};

/// Desktop browser user agent sent on API calls
///
/// The provider gates several API endpoints on user-agent sniffing; this is
/// an external compatibility requirement, not a security measure.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Content type sent on API calls
pub const API_CONTENT_TYPE: &str = "application/json;charset=UTF-8";

/// Client request headers that are not forwarded upstream
const DROPPED_REQUEST_HEADERS: [&str; 4] = ["host", "content-length", "accept-encoding", "upgrade"];

/// UpstreamClient issues every request the proxy sends to the provider
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: String,
}

impl UpstreamClient {
    /// Create a client for the configured upstream origin
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let mut builder = Client::builder().redirect(redirect::Policy::none());
        if let Some(timeout) = config.upstream_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| {
                ProxyError::UpstreamFetch(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(UpstreamClient {
            client,
            base_url: config.upstream_base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute upstream URL for a request path and query
    pub fn url_for(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url, path_and_query)
    }

    /// Re-issue an API call with the fixed content type and user agent
    pub async fn fetch_api(
        &self,
        method: Method,
        path_and_query: &str,
        body: Bytes,
    ) -> Result<Response> {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(API_CONTENT_TYPE));
        headers.insert(header::USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        self.send(method, &self.url_for(path_and_query), headers, body).await
    }

    /// Forward a request with its original method, headers and body
    pub async fn fetch_passthrough(
        &self,
        method: Method,
        path_and_query: &str,
        client_headers: &HeaderMap,
        body: Bytes,
    ) -> Result<Response> {
        let headers = forwardable_headers(client_headers);
        self.send(method, &self.url_for(path_and_query), headers, body).await
    }

    /// GET a hosted page by ID, reusing the client's request headers
    pub async fn fetch_page(&self, page_id: &str, client_headers: &HeaderMap) -> Result<Response> {
        let headers = forwardable_headers(client_headers);
        self.send(Method::GET, &self.url_for(&format!("/{}", page_id)), headers, Bytes::new())
            .await
    }

    /// GET an already-built upstream URL
    pub async fn fetch_url(&self, url: Url, client_headers: &HeaderMap) -> Result<Response> {
        let headers = forwardable_headers(client_headers);
        self.send(Method::GET, url.as_str(), headers, Bytes::new()).await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response> {
        debug!("Sending upstream request: method={}, url={}", method, url);

        let mut request = self.client.request(method.clone(), url).headers(headers);
        if !body.is_empty() {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!("Upstream request failed: method={}, url={}: {}", method, url, e);
            ProxyError::UpstreamFetch(format!("{} {} failed: {}", method, url, e))
        })?;

        debug!(
            "Received upstream response: method={}, url={}, status={}",
            method,
            url,
            response.status()
        );
        Ok(response)
    }
}

/// Client headers minus hop-by-hop and transport-specific ones
///
/// `accept-encoding` is dropped so the upstream answers uncompressed and the
/// body can be rewritten.
pub fn forwardable_headers(client_headers: &HeaderMap) -> HeaderMap {
    let mut headers = client_headers.clone();
    for name in HOP_BY_HOP_HEADERS.iter().chain(DROPPED_REQUEST_HEADERS.iter()) {
        headers.remove(*name);
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SiteConfig {
        SiteConfig::new(
            "example.com",
            &format!("https://acme.notion.site/{}", "a".repeat(32)),
        )
        .unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = UpstreamClient::new(&config());
        assert!(client.is_ok());
    }

    #[test]
    fn test_url_for() {
        let client = UpstreamClient::new(&config()).unwrap();
        assert_eq!(client.base_url(), "https://acme.notion.site");
        assert_eq!(
            client.url_for("/api/v3/getPublicPageData?x=1"),
            "https://acme.notion.site/api/v3/getPublicPageData?x=1"
        );
    }

    #[test]
    fn test_forwardable_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("example.com"));
        headers.insert("accept-encoding", HeaderValue::from_static("gzip"));
        headers.insert("connection", HeaderValue::from_static("keep-alive"));
        headers.insert("content-length", HeaderValue::from_static("3"));
        headers.insert("cookie", HeaderValue::from_static("a=b"));
        headers.insert("accept", HeaderValue::from_static("text/html"));

        let forwarded = forwardable_headers(&headers);
        assert_eq!(forwarded.len(), 2);
        assert_eq!(forwarded["cookie"], "a=b");
        assert_eq!(forwarded["accept"], "text/html");
    }
}
