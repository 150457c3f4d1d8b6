//! Request classification
//!
//! Every inbound request is classified exactly once into a [`Route`]; the
//! rules are evaluated in a fixed priority order and the first match wins.

use crate::config::SiteConfig;
use crate::redirect::resolve_subdomain_redirect;
use http::{HeaderMap, HeaderValue, Method};
use std::sync::Arc;
use tracing::debug;

/// Prefix of the page-data endpoint whose JSON gets field-patched
pub const PAGE_DATA_API_PREFIX: &str = "/api/v3/getPublicPageData";

/// Sync/space endpoints that only get hostname substitution
pub const SYNC_API_PREFIXES: [&str; 3] = [
    "/api/v3/syncRecordValuesMain",
    "/api/v3/syncRecordValuesSpaceInitial",
    "/api/v3/getPublicSpaceData",
];

pub const GENERIC_API_PREFIX: &str = "/api";

pub const IMAGE_PREFIX: &str = "/image";

/// How an API response body is rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKind {
    /// Hostname substitution plus the page-data field patch
    PageData,
    /// Sync/space endpoints, hostname substitution only
    SpaceSync,
    /// Any other API call, hostname substitution only
    Generic,
}

/// Where a request is dispatched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// CORS preflight (`Origin` + `Access-Control-Request-*` present)
    Preflight,
    /// Any other OPTIONS request
    Options,
    /// 301 to the configured target for the request's subdomain
    SubdomainRedirect { location: String },
    Robots,
    Sitemap,
    /// Hosting platform script, body rewritten and content type forced
    StaticScript { content_type: &'static str },
    Api(ApiKind),
    ImageTransform,
    /// 302 from a friendly slug to its page ID
    SlugRedirect { page_id: String },
    Passthrough,
}

impl Route {
    pub fn name(&self) -> &'static str {
        match self {
            Route::Preflight => "preflight",
            Route::Options => "options",
            Route::SubdomainRedirect { .. } => "subdomain_redirect",
            Route::Robots => "robots",
            Route::Sitemap => "sitemap",
            Route::StaticScript { .. } => "static_script",
            Route::Api(_) => "api",
            Route::ImageTransform => "image_transform",
            Route::SlugRedirect { .. } => "slug_redirect",
            Route::Passthrough => "passthrough",
        }
    }
}

/// Classifies requests by method, hostname and path
#[derive(Debug)]
pub struct RequestRouter {
    config: Arc<SiteConfig>,
}

impl RequestRouter {
    /// Create a new RequestRouter with the given configuration
    pub fn new(config: Arc<SiteConfig>) -> Self {
        RequestRouter { config }
    }

    /// Classify a request
    ///
    /// # Arguments
    /// * `method` - HTTP method of the request
    /// * `host` - Request hostname, port allowed
    /// * `path` - Request path without the query string
    /// * `query` - Raw query string, if any
    /// * `headers` - Request headers
    ///
    /// # Priority
    /// 1. OPTIONS (preflight or plain)
    /// 2. Subdomain redirect
    /// 3. robots.txt
    /// 4. sitemap.xml
    /// 5. Static-asset scripts
    /// 6. Page-data API
    /// 7. Sync/space API
    /// 8. Other API
    /// 9. Image transform (when enabled)
    /// 10. Known slug
    /// 11. Passthrough
    pub fn classify(
        &self,
        method: &Method,
        host: &str,
        path: &str,
        query: Option<&str>,
        headers: &HeaderMap<HeaderValue>,
    ) -> Route {
        let route = self.classify_inner(method, host, path, query, headers);
        debug!(
            "Classified request: method={}, host={}, path={}, route={}",
            method,
            host,
            path,
            route.name()
        );
        route
    }

    fn classify_inner(
        &self,
        method: &Method,
        host: &str,
        path: &str,
        query: Option<&str>,
        headers: &HeaderMap<HeaderValue>,
    ) -> Route {
        if method == Method::OPTIONS {
            return if is_preflight(headers) {
                Route::Preflight
            } else {
                Route::Options
            };
        }

        if let Some(location) = resolve_subdomain_redirect(&self.config, host, path, query) {
            return Route::SubdomainRedirect { location };
        }

        match path {
            "/robots.txt" => return Route::Robots,
            "/sitemap.xml" => return Route::Sitemap,
            _ => {}
        }

        if let Some(content_type) = static_script_content_type(path) {
            return Route::StaticScript { content_type };
        }

        if path.starts_with(PAGE_DATA_API_PREFIX) {
            return Route::Api(ApiKind::PageData);
        }
        if SYNC_API_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
            return Route::Api(ApiKind::SpaceSync);
        }
        if path.starts_with(GENERIC_API_PREFIX) {
            return Route::Api(ApiKind::Generic);
        }

        if path.starts_with(IMAGE_PREFIX) && self.config.image.is_enabled() {
            return Route::ImageTransform;
        }

        let slug = path.strip_prefix('/').unwrap_or(path);
        if let Some(page_id) = self.config.slug_index.resolve_slug(slug) {
            return Route::SlugRedirect {
                page_id: page_id.to_string(),
            };
        }

        Route::Passthrough
    }
}

/// A CORS preflight carries all three of these headers
fn is_preflight(headers: &HeaderMap<HeaderValue>) -> bool {
    headers.contains_key(http::header::ORIGIN)
        && headers.contains_key(http::header::ACCESS_CONTROL_REQUEST_METHOD)
        && headers.contains_key(http::header::ACCESS_CONTROL_REQUEST_HEADERS)
}

/// Content type forced onto hosting-platform scripts, if `path` is one
///
/// `/app…js` bundles get the legacy `application/x-javascript`;
/// `/_assets/….js` bundles get `application/javascript`.
pub fn static_script_content_type(path: &str) -> Option<&'static str> {
    if path.starts_with("/app") && path.ends_with("js") {
        Some("application/x-javascript")
    } else if path.starts_with("/_assets/") && path.ends_with(".js") {
        Some("application/javascript")
    } else {
        None
    }
}
