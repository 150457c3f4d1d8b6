//! Upstream hostname substitution for text bodies and page-data JSON patching

use crate::error::{ProxyError, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Generic hosting hostname replaced as a fallback
pub const GENERIC_UPSTREAM_HOST: &str = "www.notion.so";

/// Brand name of the hosting provider as it appears in page metadata
pub const UPSTREAM_BRAND: &str = "Notion";

fn site_host_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[a-z0-9-]+\.notion\.site").expect("site host pattern is a valid regex")
    })
}

/// Rewrites upstream hostnames in response bodies to the custom domain
#[derive(Debug, Clone)]
pub struct BodyRewriter {
    domain: String,
}

impl BodyRewriter {
    pub fn new(domain: impl Into<String>) -> Self {
        BodyRewriter {
            domain: domain.into(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Replace every `*.notion.site` host and `www.notion.so` with the custom domain
    pub fn rewrite_body(&self, body: &str) -> String {
        let replaced = site_host_pattern().replace_all(body, self.domain.as_str());
        replaced.replace(GENERIC_UPSTREAM_HOST, &self.domain)
    }

    /// Hostname substitution followed by the page-data field patch
    ///
    /// A body that is not a JSON object is returned with only the hostname
    /// substitution applied.
    pub fn rewrite_page_data(&self, body: &str) -> String {
        let rewritten = self.rewrite_body(body);
        match self.patch_page_data(&rewritten) {
            Ok(patched) => patched,
            Err(e) => {
                warn!("Serving text-substituted page data: {}", e);
                rewritten
            }
        }
    }

    /// Patch the fields that make the upstream redirect or show an interstitial
    ///
    /// - `spaceDomain` (when truthy) becomes the first label of the custom domain
    /// - `publicDomainName` (when truthy) becomes the custom domain
    /// - `requireInterstitial` is removed
    /// - `requestedOnExternalDomain` is forced to `false`
    pub fn patch_page_data(&self, body: &str) -> Result<String> {
        let mut json: Value = serde_json::from_str(body)
            .map_err(|e| ProxyError::BodyParse(format!("page data is not JSON: {}", e)))?;
        let object = json
            .as_object_mut()
            .ok_or_else(|| ProxyError::BodyParse("page data is not a JSON object".to_string()))?;

        if object.get("spaceDomain").is_some_and(is_truthy) {
            let first_label = self.domain.split('.').next().unwrap_or(&self.domain);
            object.insert("spaceDomain".to_string(), Value::String(first_label.to_string()));
        }
        if object.get("publicDomainName").is_some_and(is_truthy) {
            object.insert("publicDomainName".to_string(), Value::String(self.domain.clone()));
        }
        object.remove("requireInterstitial");
        object.insert("requestedOnExternalDomain".to_string(), Value::Bool(false));

        debug!("Patched page data for domain={}", self.domain);
        serde_json::to_string(&json)
            .map_err(|e| ProxyError::BodyParse(format!("failed to serialize page data: {}", e)))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
