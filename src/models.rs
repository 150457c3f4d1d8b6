//! Option groups shared by configuration loading and the rewrite units

use serde::{Deserialize, Serialize};

/// Per-slug overrides for title, description and social image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub og_image: Option<String>,
}

/// schema.org type used for the injected JSON-LD block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaType {
    #[default]
    WebPage,
    Article,
    Organization,
}

impl SchemaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::WebPage => "WebPage",
            SchemaType::Article => "Article",
            SchemaType::Organization => "Organization",
        }
    }

    /// WebPage and Article nest the organization under `publisher`
    pub fn has_publisher(&self) -> bool {
        matches!(self, SchemaType::WebPage | SchemaType::Article)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredDataOptions {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub schema_type: SchemaType,
    #[serde(default)]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandingOptions {
    /// Value for `og:site_name` (falls back to the custom domain)
    #[serde(default)]
    pub site_name: Option<String>,
    /// Replaces the upstream brand name inside meta `content` attributes
    #[serde(default)]
    pub brand_replacement: Option<String>,
    #[serde(default)]
    pub twitter_handle: Option<String>,
    #[serde(default)]
    pub favicon_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoOptions {
    #[serde(default)]
    pub ai_attribution: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsOptions {
    #[serde(default)]
    pub google_tag_id: Option<String>,
    #[serde(default)]
    pub facebook_pixel_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomHtmlOptions {
    /// Raw HTML prepended to `<body>`
    #[serde(default)]
    pub header_html: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Custom404Options {
    /// Hosted page URL or bare page ID served for upstream 404s
    #[serde(default)]
    pub page_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubdomainRedirect {
    pub subdomain: String,
    pub redirect_url: String,
}

/// Image transform settings forwarded to the upstream image endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageOptions {
    /// `"resize"` enables the transform passthrough; anything else disables it
    #[serde(default)]
    pub resize_type: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub quality: Option<u32>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub fit: Option<String>,
    #[serde(default)]
    pub blur: Option<u32>,
    #[serde(default)]
    pub anim: Option<bool>,
    #[serde(default)]
    pub metadata: Option<String>,
}

impl ImageOptions {
    pub fn is_enabled(&self) -> bool {
        self.resize_type.as_deref() == Some("resize")
    }
}

/// Treat `Some("")` the same as an unset option
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_type_publisher() {
        assert!(SchemaType::WebPage.has_publisher());
        assert!(SchemaType::Article.has_publisher());
        assert!(!SchemaType::Organization.has_publisher());
    }

    #[test]
    fn test_schema_type_default_is_webpage() {
        assert_eq!(SchemaType::default(), SchemaType::WebPage);
        assert_eq!(SchemaType::default().as_str(), "WebPage");
    }

    #[test]
    fn test_image_options_enabled_only_for_resize() {
        let mut options = ImageOptions::default();
        assert!(!options.is_enabled());
        options.resize_type = Some("none".to_string());
        assert!(!options.is_enabled());
        options.resize_type = Some("resize".to_string());
        assert!(options.is_enabled());
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(&None), None);
        assert_eq!(non_empty(&Some(String::new())), None);
        assert_eq!(non_empty(&Some("x".to_string())), Some("x"));
    }

    #[test]
    fn test_schema_type_deserializes_from_name() {
        let parsed: StructuredDataOptions =
            serde_yaml::from_str("enabled: true\nschema_type: Organization\n").unwrap();
        assert!(parsed.enabled);
        assert_eq!(parsed.schema_type, SchemaType::Organization);
    }
}
