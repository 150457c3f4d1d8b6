//! Image transform passthrough
//!
//! The proxy does not process images. It forwards the configured transform
//! parameters to the upstream image endpoint as query parameters and relays
//! the upstream response.

use crate::error::{ProxyError, Result};
use crate::models::{non_empty, ImageOptions};
use crate::response::{strip_hop_by_hop, upstream_body, with_parts, ProxyBody};
use crate::upstream::UpstreamClient;
use http::{HeaderMap, Response};
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Transform parameters; unset fields are omitted
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImageTransformOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blur: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anim: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

impl ImageTransformOptions {
    pub fn from_options(options: &ImageOptions) -> Self {
        ImageTransformOptions {
            width: options.width,
            height: options.height,
            quality: options.quality,
            format: non_empty(&options.format).map(str::to_string),
            fit: non_empty(&options.fit).map(str::to_string),
            blur: options.blur,
            anim: options.anim,
            metadata: non_empty(&options.metadata).map(str::to_string),
        }
    }

    /// Set fields as `(name, value)` pairs, in declaration order
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let value = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => return Vec::new(),
        };
        value
            .into_iter()
            .map(|(name, value)| {
                let text = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (name, text)
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        *self == ImageTransformOptions::default()
    }

    /// Merge the parameters into `url`, replacing same-named query pairs
    pub fn apply_to(&self, url: &mut Url) {
        let pairs = self.to_pairs();
        if pairs.is_empty() {
            return;
        }
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(name, _)| !pairs.iter().any(|(set, _)| set == name))
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        url.query_pairs_mut().clear().extend_pairs(kept).extend_pairs(pairs);
    }
}

/// Forwards image requests with the configured transform parameters
#[derive(Debug, Clone)]
pub struct ImageTransform {
    upstream: UpstreamClient,
    options: ImageTransformOptions,
}

impl ImageTransform {
    pub fn new(upstream: UpstreamClient, options: &ImageOptions) -> Self {
        ImageTransform {
            upstream,
            options: ImageTransformOptions::from_options(options),
        }
    }

    pub fn options(&self) -> &ImageTransformOptions {
        &self.options
    }

    /// Upstream URL for an image request, parameters applied
    pub fn upstream_url(&self, path_and_query: &str) -> Result<Url> {
        let raw = self.upstream.url_for(path_and_query);
        let mut url = Url::parse(&raw)
            .map_err(|e| ProxyError::Http(format!("invalid image url {}: {}", raw, e)))?;
        self.options.apply_to(&mut url);
        Ok(url)
    }

    /// Fetch the image and relay the upstream response
    pub async fn forward(
        &self,
        path_and_query: &str,
        client_headers: &HeaderMap,
    ) -> Result<Response<ProxyBody>> {
        let url = self.upstream_url(path_and_query)?;
        debug!("Forwarding image transform: url={}", url);

        let upstream = self.upstream.fetch_url(url, client_headers).await?;
        let status = upstream.status();
        let mut headers = upstream.headers().clone();
        strip_hop_by_hop(&mut headers);
        Ok(with_parts(status, headers, upstream_body(upstream)))
    }
}
