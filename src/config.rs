//! Configuration management for the Worknot proxy
//!
//! The YAML file is deserialized into [`SiteSettings`], validated, and frozen
//! into a [`SiteConfig`] that every request handler reads through an `Arc`.

use crate::error::{ProxyError, Result};
use crate::models::{
    non_empty, AnalyticsOptions, BrandingOptions, Custom404Options, CustomHtmlOptions,
    ImageOptions, PageMetadata, SeoOptions, StructuredDataOptions, SubdomainRedirect,
};
use crate::slug_index::{extract_page_id, SlugIndex};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Hostname used when the hosted page URL cannot be parsed
pub const FALLBACK_UPSTREAM_HOST: &str = "www.notion.so";

/// Listener and upstream connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSettings {
    /// Address the proxy listens on (default: "0.0.0.0:8080")
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Override for the upstream origin, e.g. "http://127.0.0.1:9000"
    /// (default: https://{upstream site host})
    #[serde(default)]
    pub upstream_base_url: Option<String>,

    /// Upstream request timeout in seconds (default: none)
    #[serde(default)]
    pub upstream_timeout_secs: Option<u64>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            upstream_base_url: None,
            upstream_timeout_secs: None,
        }
    }
}

/// One configured slug and the hosted page it points at
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlugEntry {
    pub slug: String,
    /// Hosted page URL or bare page ID
    pub page_url: String,
}

/// Raw settings as written in the configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteSettings {
    #[serde(default)]
    pub server: ServerSettings,

    /// Custom domain, e.g. "example.com" (scheme and trailing slash allowed)
    pub domain: String,

    /// Hosted URL of the root page
    pub site_url: String,

    #[serde(default)]
    pub slugs: Vec<SlugEntry>,

    #[serde(default)]
    pub page_title: String,

    #[serde(default)]
    pub page_description: String,

    #[serde(default)]
    pub page_metadata: HashMap<String, PageMetadata>,

    #[serde(default)]
    pub google_font: String,

    #[serde(default)]
    pub custom_script: String,

    #[serde(default)]
    pub custom_css: String,

    #[serde(default)]
    pub structured_data: StructuredDataOptions,

    #[serde(default)]
    pub branding: BrandingOptions,

    #[serde(default)]
    pub seo: SeoOptions,

    #[serde(default)]
    pub analytics: AnalyticsOptions,

    #[serde(default)]
    pub custom_html: CustomHtmlOptions,

    #[serde(default)]
    pub custom_404: Custom404Options,

    #[serde(default)]
    pub subdomain_redirects: Vec<SubdomainRedirect>,

    #[serde(default)]
    pub image: ImageOptions,
}

// Default value functions for serde
fn default_listen_address() -> String {
    "0.0.0.0:8080".to_string()
}

/// Strip a leading scheme and trailing slash from a domain setting
pub fn normalize_domain(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without_scheme
        .strip_suffix('/')
        .unwrap_or(without_scheme)
        .to_ascii_lowercase()
}

fn is_valid_domain(domain: &str) -> bool {
    if domain.is_empty() || domain.len() > 253 || !domain.contains('.') {
        return false;
    }
    domain.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    })
}

impl SiteSettings {
    /// Validate the settings
    ///
    /// # Validation Rules
    /// - domain must be a bare hostname after normalization
    /// - site_url must end in a valid page ID
    /// - custom_404.page_url, when set, must end in a valid page ID
    /// - subdomain redirect targets must be absolute http(s) URLs
    /// - image.quality must be within 1..=100
    /// - server.upstream_base_url, when set, must be an absolute http(s) URL
    pub fn validate(&self) -> Result<()> {
        let domain = normalize_domain(&self.domain);
        if !is_valid_domain(&domain) {
            return Err(ProxyError::config(format!(
                "domain must be a bare hostname like 'example.com', got '{}'",
                self.domain
            )));
        }

        if extract_page_id(&self.site_url).is_none() {
            return Err(ProxyError::config(format!(
                "site_url must end with a 32-character page id, got '{}'",
                self.site_url
            )));
        }

        if let Some(page_url) = non_empty(&self.custom_404.page_url) {
            if extract_page_id(page_url).is_none() {
                return Err(ProxyError::config(format!(
                    "custom_404.page_url must end with a 32-character page id, got '{}'",
                    page_url
                )));
            }
        }

        for redirect in &self.subdomain_redirects {
            if redirect.subdomain.is_empty() || redirect.redirect_url.is_empty() {
                continue;
            }
            if !(redirect.redirect_url.starts_with("https://")
                || redirect.redirect_url.starts_with("http://"))
            {
                return Err(ProxyError::config(format!(
                    "redirect_url for subdomain '{}' must start with http:// or https://, got '{}'",
                    redirect.subdomain, redirect.redirect_url
                )));
            }
        }

        if let Some(quality) = self.image.quality {
            if quality == 0 || quality > 100 {
                return Err(ProxyError::config(format!(
                    "image.quality must be between 1 and 100, got {}",
                    quality
                )));
            }
        }

        if let Some(base) = &self.server.upstream_base_url {
            match Url::parse(base) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                _ => {
                    return Err(ProxyError::config(format!(
                        "server.upstream_base_url must be an absolute http(s) URL, got '{}'",
                        base
                    )))
                }
            }
        }

        Ok(())
    }
}

/// Immutable site configuration shared by every request
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub server: ServerSettings,
    /// Validated custom hostname (no scheme, no trailing slash)
    pub domain: String,
    /// Hostname of the provider's page-hosting endpoint
    pub upstream_site_host: String,
    /// Origin all upstream requests are sent to
    pub upstream_base_url: String,
    pub slug_index: SlugIndex,
    pub page_title: String,
    pub page_description: String,
    pub page_metadata: HashMap<String, PageMetadata>,
    pub google_font: String,
    pub custom_script: String,
    pub custom_css: String,
    pub structured_data: StructuredDataOptions,
    pub branding: BrandingOptions,
    pub seo: SeoOptions,
    pub analytics: AnalyticsOptions,
    pub custom_html: CustomHtmlOptions,
    /// Page ID substituted for upstream 404 bodies
    pub custom_404_page_id: Option<String>,
    /// Subdomain label(s) → redirect base URL
    pub subdomain_redirects: HashMap<String, String>,
    pub image: ImageOptions,
}

impl SiteConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ProxyError::config(format!("Failed to read config file: {}", e))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let settings: SiteSettings = serde_yaml::from_str(content).map_err(|e| {
            ProxyError::config(format!("Failed to parse config file: {}", e))
        })?;
        Self::from_settings(settings)
    }

    /// Validate raw settings and freeze them into a SiteConfig
    pub fn from_settings(settings: SiteSettings) -> Result<Self> {
        settings.validate()?;

        let domain = normalize_domain(&settings.domain);
        let upstream_site_host = Url::parse(&settings.site_url)
            .ok()
            .and_then(|url| url.host_str().map(|host| host.to_string()))
            .unwrap_or_else(|| FALLBACK_UPSTREAM_HOST.to_string());

        let root_page_id = extract_page_id(&settings.site_url).ok_or_else(|| {
            ProxyError::config("site_url must end with a 32-character page id")
        })?;
        let entries = settings.slugs.iter().map(|entry| {
            let page_id =
                extract_page_id(&entry.page_url).unwrap_or_else(|| entry.page_url.clone());
            (entry.slug.trim_matches('/').to_string(), page_id)
        });
        let slug_index = SlugIndex::build(&root_page_id, entries)
            .ok_or_else(|| ProxyError::config("root page id is invalid"))?;

        for slug in settings.page_metadata.keys() {
            if !slug_index.contains_slug(slug) && slug != "404" {
                warn!(
                    "page_metadata entry for unknown slug will only apply if the slug is added: slug={}",
                    slug
                );
            }
        }

        let upstream_base_url = settings
            .server
            .upstream_base_url
            .clone()
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("https://{}", upstream_site_host));

        let custom_404_page_id = non_empty(&settings.custom_404.page_url).and_then(extract_page_id);

        let subdomain_redirects = settings
            .subdomain_redirects
            .iter()
            .filter(|r| !r.subdomain.is_empty() && !r.redirect_url.is_empty())
            .map(|r| (r.subdomain.to_ascii_lowercase(), r.redirect_url.clone()))
            .collect();

        Ok(SiteConfig {
            server: settings.server,
            domain,
            upstream_site_host,
            upstream_base_url,
            slug_index,
            page_title: settings.page_title,
            page_description: settings.page_description,
            page_metadata: settings.page_metadata,
            google_font: settings.google_font,
            custom_script: settings.custom_script,
            custom_css: settings.custom_css,
            structured_data: settings.structured_data,
            branding: settings.branding,
            seo: settings.seo,
            analytics: settings.analytics,
            custom_html: settings.custom_html,
            custom_404_page_id,
            subdomain_redirects,
            image: settings.image,
        })
    }

    /// Minimal configuration for a domain and root page, mostly for tests
    pub fn new(domain: &str, site_url: &str) -> Result<Self> {
        Self::from_settings(SiteSettings {
            domain: domain.to_string(),
            site_url: site_url.to_string(),
            ..Default::default()
        })
    }

    /// `https://{domain}/{slug}`, or the bare domain URL for the root slug
    pub fn canonical_url(&self, slug: &str) -> String {
        if slug.is_empty() {
            format!("https://{}", self.domain)
        } else {
            format!("https://{}/{}", self.domain, slug)
        }
    }

    /// Metadata overrides for `slug`, if any
    pub fn page_metadata_for(&self, slug: &str) -> Option<&PageMetadata> {
        self.page_metadata.get(slug)
    }

    /// Per-slug title, else the site default; empty when neither is set
    pub fn resolved_title(&self, slug: &str) -> &str {
        self.page_metadata_for(slug)
            .and_then(|m| non_empty(&m.title))
            .unwrap_or(self.page_title.as_str())
    }

    /// Per-slug description, else the site default; empty when neither is set
    pub fn resolved_description(&self, slug: &str) -> &str {
        self.page_metadata_for(slug)
            .and_then(|m| non_empty(&m.description))
            .unwrap_or(self.page_description.as_str())
    }

    pub fn resolved_og_image(&self, slug: &str) -> Option<&str> {
        self.page_metadata_for(slug).and_then(|m| non_empty(&m.og_image))
    }

    pub fn upstream_timeout(&self) -> Option<Duration> {
        self.server.upstream_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(c: char) -> String {
        c.to_string().repeat(32)
    }

    fn base_settings() -> SiteSettings {
        SiteSettings {
            domain: "example.com".to_string(),
            site_url: format!("https://acme.notion.site/Home-{}", id('a')),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain("https://Example.com/"), "example.com");
        assert_eq!(normalize_domain("http://blog.example.com"), "blog.example.com");
        assert_eq!(normalize_domain(" example.com "), "example.com");
    }

    #[test]
    fn test_validate_valid_settings() {
        assert!(base_settings().validate().is_ok());
    }

    #[test]
    fn test_validate_bad_domain() {
        for domain in ["", "localhost", "exa mple.com", "example.com/path", "-bad.com"] {
            let mut settings = base_settings();
            settings.domain = domain.to_string();
            assert!(settings.validate().is_err(), "domain {:?} should be rejected", domain);
        }
    }

    #[test]
    fn test_validate_bad_root_page() {
        let mut settings = base_settings();
        settings.site_url = "https://acme.notion.site/Home".to_string();
        assert!(matches!(
            settings.validate(),
            Err(ProxyError::ConfigValidation(_))
        ));
    }

    #[test]
    fn test_validate_bad_custom_404() {
        let mut settings = base_settings();
        settings.custom_404.page_url = Some("https://acme.notion.site/Missing".to_string());
        assert!(settings.validate().is_err());

        settings.custom_404.page_url = Some(String::new());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_redirect_target() {
        let mut settings = base_settings();
        settings.subdomain_redirects.push(SubdomainRedirect {
            subdomain: "www".to_string(),
            redirect_url: "example.com".to_string(),
        });
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_image_quality() {
        let mut settings = base_settings();
        settings.image.quality = Some(0);
        assert!(settings.validate().is_err());
        settings.image.quality = Some(101);
        assert!(settings.validate().is_err());
        settings.image.quality = Some(85);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_from_settings_derives_upstream() {
        let config = SiteConfig::from_settings(base_settings()).unwrap();
        assert_eq!(config.domain, "example.com");
        assert_eq!(config.upstream_site_host, "acme.notion.site");
        assert_eq!(config.upstream_base_url, "https://acme.notion.site");
        assert_eq!(config.slug_index.root_page_id(), id('a'));
    }

    #[test]
    fn test_from_settings_upstream_override() {
        let mut settings = base_settings();
        settings.server.upstream_base_url = Some("http://127.0.0.1:9000/".to_string());
        let config = SiteConfig::from_settings(settings).unwrap();
        assert_eq!(config.upstream_base_url, "http://127.0.0.1:9000");
        assert_eq!(config.upstream_site_host, "acme.notion.site");
    }

    #[test]
    fn test_from_settings_filters_redirects() {
        let mut settings = base_settings();
        settings.subdomain_redirects = vec![
            SubdomainRedirect {
                subdomain: "WWW".to_string(),
                redirect_url: "https://example.com".to_string(),
            },
            SubdomainRedirect {
                subdomain: "blog".to_string(),
                redirect_url: String::new(),
            },
        ];
        let config = SiteConfig::from_settings(settings).unwrap();
        assert_eq!(config.subdomain_redirects.len(), 1);
        assert_eq!(
            config.subdomain_redirects.get("www").map(String::as_str),
            Some("https://example.com")
        );
    }

    #[test]
    fn test_resolved_metadata_fallbacks() {
        let mut settings = base_settings();
        settings.page_title = "Site".to_string();
        settings.page_metadata.insert(
            "about".to_string(),
            PageMetadata {
                title: Some("About".to_string()),
                description: None,
                og_image: Some("https://cdn.example.com/a.png".to_string()),
            },
        );
        let config = SiteConfig::from_settings(settings).unwrap();
        assert_eq!(config.resolved_title("about"), "About");
        assert_eq!(config.resolved_title("other"), "Site");
        assert_eq!(config.resolved_description("about"), "");
        assert_eq!(config.resolved_og_image("about"), Some("https://cdn.example.com/a.png"));
        assert_eq!(config.resolved_og_image(""), None);
    }

    #[test]
    fn test_canonical_url() {
        let config = SiteConfig::from_settings(base_settings()).unwrap();
        assert_eq!(config.canonical_url(""), "https://example.com");
        assert_eq!(config.canonical_url("about"), "https://example.com/about");
    }

    #[test]
    fn test_from_yaml_str() {
        let yaml = format!(
            r#"
domain: "https://example.com/"
site_url: "https://acme.notion.site/Home-{root}"
slugs:
  - slug: about
    page_url: "https://acme.notion.site/About-{about}"
  - slug: broken
    page_url: "https://acme.notion.site/Broken"
page_title: "Acme"
custom_404:
  page_url: "{missing}"
structured_data:
  enabled: true
  schema_type: Article
image:
  resize_type: resize
  width: 800
"#,
            root = id('a'),
            about = id('b'),
            missing = id('c'),
        );
        let config = SiteConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(config.domain, "example.com");
        assert_eq!(config.slug_index.len(), 2);
        assert_eq!(config.slug_index.resolve_slug("about"), Some(id('b').as_str()));
        assert_eq!(config.custom_404_page_id, Some(id('c')));
        assert!(config.structured_data.enabled);
        assert!(config.image.is_enabled());
        assert_eq!(config.image.width, Some(800));
        assert_eq!(config.server.listen_address, "0.0.0.0:8080");
    }

    #[test]
    fn test_from_yaml_missing_domain() {
        let result = SiteConfig::from_yaml_str("site_url: x\n");
        assert!(matches!(result, Err(ProxyError::ConfigValidation(_))));
    }
}
