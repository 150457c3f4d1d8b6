//! API and platform-script forwarding with body rewriting

use crate::body_rewriter::BodyRewriter;
use crate::error::Result;
use crate::response::{full, prepare_rewritten_headers, strip_csp, with_parts, ProxyBody};
use crate::router::ApiKind;
use crate::upstream::UpstreamClient;
use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderValue};
use http::{Method, Response};
use tracing::debug;

/// Forwards API calls and platform scripts, rewriting their bodies
#[derive(Debug, Clone)]
pub struct ApiProxy {
    upstream: UpstreamClient,
    rewriter: BodyRewriter,
}

impl ApiProxy {
    pub fn new(upstream: UpstreamClient, rewriter: BodyRewriter) -> Self {
        ApiProxy { upstream, rewriter }
    }

    /// Re-issue an API call and rewrite the response
    ///
    /// Non-2xx upstream responses go through the same rewriting and header
    /// rules; nothing is retried.
    pub async fn forward(
        &self,
        kind: ApiKind,
        method: Method,
        path_and_query: &str,
        body: Bytes,
    ) -> Result<Response<ProxyBody>> {
        let upstream = self.upstream.fetch_api(method, path_and_query, body).await?;
        let status = upstream.status();
        let mut headers = upstream.headers().clone();
        let text = upstream.text().await?;

        let rewritten = match kind {
            ApiKind::PageData => self.rewriter.rewrite_page_data(&text),
            ApiKind::SpaceSync | ApiKind::Generic => self.rewriter.rewrite_body(&text),
        };
        debug!(
            "Rewrote API response: path={}, kind={:?}, status={}, bytes={}",
            path_and_query,
            kind,
            status,
            rewritten.len()
        );

        prepare_rewritten_headers(&mut headers);
        strip_csp(&mut headers);
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        Ok(with_parts(status, headers, full(rewritten)))
    }

    /// Fetch a platform script, rewrite it, and force a JavaScript content type
    pub async fn forward_script(
        &self,
        path_and_query: &str,
        content_type: &'static str,
    ) -> Result<Response<ProxyBody>> {
        let upstream = self
            .upstream
            .fetch_passthrough(Method::GET, path_and_query, &HeaderMap::new(), Bytes::new())
            .await?;
        let status = upstream.status();
        let mut headers = upstream.headers().clone();
        let text = upstream.text().await?;
        let rewritten = self.rewriter.rewrite_body(&text);

        prepare_rewritten_headers(&mut headers);
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        Ok(with_parts(status, headers, full(rewritten)))
    }
}
