//! SiteProxy: per-request dispatch
//!
//! `SiteProxy` ties the router, the upstream client, the API proxy, the image
//! passthrough and the HTML pipeline together. One instance is shared by every
//! connection; it holds only the immutable configuration and a cloneable
//! HTTP client.

use crate::api_proxy::ApiProxy;
use crate::body_rewriter::BodyRewriter;
use crate::config::SiteConfig;
use crate::error::{ProxyError, Result};
use crate::html::{transform_stream, PageRewriter};
use crate::image::ImageTransform;
use crate::redirect::{custom_404_target, slug_redirect_location};
use crate::response::{
    error_response, is_html, options_response, preflight_response, prepare_rewritten_headers,
    redirect_response, strip_csp, strip_hop_by_hop, text_response, upstream_body, with_parts,
    ProxyBody,
};
use crate::router::{RequestRouter, Route};
use crate::sitemap::{generate_robots, generate_sitemap};
use crate::slug_index::{last_chars, PAGE_ID_LEN};
use crate::upstream::UpstreamClient;
use bytes::Bytes;
use futures::TryStreamExt;
use http::header::{self, HeaderMap};
use http::request::Parts;
use http::{Request, Response, StatusCode};
use http_body_util::BodyExt;
use hyper::body::Body;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Pseudo-slug the HTML pipeline is bound to for the custom 404 page
pub const NOT_FOUND_SLUG: &str = "404";

/// Request handler for the proxied site
#[derive(Debug, Clone)]
pub struct SiteProxy {
    config: Arc<SiteConfig>,
    router: Arc<RequestRouter>,
    upstream: UpstreamClient,
    api: ApiProxy,
    images: ImageTransform,
}

impl SiteProxy {
    /// Create a new SiteProxy
    ///
    /// # Errors
    /// Returns `ProxyError::UpstreamFetch` if the HTTP client cannot be built.
    pub fn new(config: Arc<SiteConfig>) -> Result<Self> {
        let upstream = UpstreamClient::new(&config)?;
        let api = ApiProxy::new(upstream.clone(), BodyRewriter::new(config.domain.clone()));
        let images = ImageTransform::new(upstream.clone(), &config.image);

        info!(
            "Created SiteProxy: domain={}, upstream={}, slugs={}",
            config.domain,
            upstream.base_url(),
            config.slug_index.len()
        );

        Ok(SiteProxy {
            router: Arc::new(RequestRouter::new(config.clone())),
            config,
            upstream,
            api,
            images,
        })
    }

    pub fn config(&self) -> &Arc<SiteConfig> {
        &self.config
    }

    /// Handle one request
    ///
    /// Never fails: errors are turned into a plain-text response whose status
    /// comes from `ProxyError::to_http_status`.
    pub async fn handle<B>(&self, request: Request<B>) -> Response<ProxyBody>
    where
        B: Body,
        B::Error: Display,
    {
        let (parts, body) = request.into_parts();
        let host = request_host(&parts).to_string();
        let route = self.router.classify(
            &parts.method,
            &host,
            parts.uri.path(),
            parts.uri.query(),
            &parts.headers,
        );
        let route_name = route.name();

        match self.dispatch(route, &parts, body).await {
            Ok(response) => {
                debug!(
                    "Request complete: method={}, path={}, route={}, status={}",
                    parts.method,
                    parts.uri.path(),
                    route_name,
                    response.status()
                );
                response
            }
            Err(e) => {
                warn!(
                    "Request failed: method={}, path={}, route={}: {}",
                    parts.method,
                    parts.uri.path(),
                    route_name,
                    e
                );
                error_response(&e)
            }
        }
    }

    async fn dispatch<B>(&self, route: Route, parts: &Parts, body: B) -> Result<Response<ProxyBody>>
    where
        B: Body,
        B::Error: Display,
    {
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        match route {
            Route::Preflight => Ok(preflight_response()),
            Route::Options => Ok(options_response()),
            Route::SubdomainRedirect { location } => {
                Ok(redirect_response(StatusCode::MOVED_PERMANENTLY, &location))
            }
            Route::Robots => Ok(text_response("text/plain", generate_robots(&self.config))),
            Route::Sitemap => Ok(text_response("application/xml", generate_sitemap(&self.config))),
            Route::StaticScript { content_type } => {
                self.api.forward_script(path_and_query, content_type).await
            }
            Route::Api(kind) => {
                let body = collect_body(body).await?;
                self.api
                    .forward(kind, parts.method.clone(), path_and_query, body)
                    .await
            }
            Route::ImageTransform => self.images.forward(path_and_query, &parts.headers).await,
            Route::SlugRedirect { page_id } => Ok(redirect_response(
                StatusCode::FOUND,
                &slug_redirect_location(&self.config, &page_id),
            )),
            Route::Passthrough => {
                let body = collect_body(body).await?;
                self.passthrough(parts, path_and_query, body).await
            }
        }
    }

    async fn passthrough(
        &self,
        parts: &Parts,
        path_and_query: &str,
        body: Bytes,
    ) -> Result<Response<ProxyBody>> {
        let upstream = self
            .upstream
            .fetch_passthrough(parts.method.clone(), path_and_query, &parts.headers, body)
            .await?;

        if let Some(page_id) = custom_404_target(&self.config, upstream.status()) {
            return self.custom_404(page_id, &parts.headers).await;
        }

        let page_id = last_chars(parts.uri.path(), PAGE_ID_LEN);
        let slug = self.config.slug_index.resolve_canonical_slug(page_id).to_string();
        let status = upstream.status();
        Ok(self.render(upstream, status, slug))
    }

    /// Replace an upstream 404 with the configured page, keeping status 404
    async fn custom_404(
        &self,
        page_id: &str,
        client_headers: &HeaderMap,
    ) -> Result<Response<ProxyBody>> {
        info!("Serving custom 404 page: page_id={}", page_id);
        let upstream = self
            .upstream
            .fetch_page(page_id, client_headers)
            .await
            .map_err(|e| ProxyError::missing_404_target(page_id, e.to_string()))?;
        Ok(self.render(upstream, StatusCode::NOT_FOUND, NOT_FOUND_SLUG.to_string()))
    }

    /// Relay an upstream page, streaming HTML through the rewrite pipeline
    fn render(
        &self,
        upstream: reqwest::Response,
        status: StatusCode,
        slug: String,
    ) -> Response<ProxyBody> {
        let mut headers = upstream.headers().clone();
        strip_csp(&mut headers);

        if is_html(&headers) {
            prepare_rewritten_headers(&mut headers);
            debug!("Rewriting HTML response: slug={}, status={}", slug, status);
            let rewriter = PageRewriter::new(self.config.clone(), slug);
            let chunks = upstream.bytes_stream().map_err(ProxyError::from);
            with_parts(status, headers, transform_stream(rewriter, chunks))
        } else {
            strip_hop_by_hop(&mut headers);
            with_parts(status, headers, upstream_body(upstream))
        }
    }
}

/// Hostname the client addressed, from `Host` or the request URI
fn request_host(parts: &Parts) -> &str {
    parts
        .headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| parts.uri.host())
        .unwrap_or("")
}

async fn collect_body<B>(body: B) -> Result<Bytes>
where
    B: Body,
    B::Error: Display,
{
    let collected = body
        .collect()
        .await
        .map_err(|e| ProxyError::Http(format!("Failed to read request body: {}", e)))?;
    Ok(collected.to_bytes())
}
