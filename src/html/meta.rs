//! Title/Meta unit

use crate::body_rewriter::UPSTREAM_BRAND;
use crate::config::SiteConfig;
use crate::models::non_empty;
use lol_html::html_content::ContentType;
use lol_html::send::Element;
use lol_html::HandlerResult;

/// Replace the `<title>` text with the resolved page title, when there is one
pub fn rewrite_title(config: &SiteConfig, slug: &str, element: &mut Element<'_, '_>) {
    let title = config.resolved_title(slug);
    if !title.is_empty() {
        element.set_inner_content(title, ContentType::Text);
    }
}

fn is_named(element: &Element<'_, '_>, attribute: &str, value: &str) -> bool {
    element.get_attribute(attribute).as_deref() == Some(value)
}

/// Apply the meta tag rules for the page bound to `slug`
pub fn rewrite_meta(
    config: &SiteConfig,
    slug: &str,
    element: &mut Element<'_, '_>,
) -> HandlerResult {
    if is_named(element, "name", "robots") {
        let noindex = element
            .get_attribute("content")
            .map(|content| content.contains("noindex"))
            .unwrap_or(false);
        if noindex {
            element.remove();
            return Ok(());
        }
    }

    if is_named(element, "property", "og:site_name") {
        let site_name = non_empty(&config.branding.site_name).unwrap_or(config.domain.as_str());
        element.set_attribute("content", site_name)?;
    }

    if let Some(replacement) = non_empty(&config.branding.brand_replacement) {
        if let Some(content) = element.get_attribute("content") {
            if content.contains(UPSTREAM_BRAND) {
                element.set_attribute("content", &content.replace(UPSTREAM_BRAND, replacement))?;
            }
        }
    }

    let title = config.resolved_title(slug);
    if !title.is_empty()
        && (is_named(element, "property", "og:title") || is_named(element, "name", "twitter:title"))
    {
        element.set_attribute("content", title)?;
    }

    let description = config.resolved_description(slug);
    if !description.is_empty()
        && (is_named(element, "name", "description")
            || is_named(element, "property", "og:description")
            || is_named(element, "name", "twitter:description"))
    {
        element.set_attribute("content", description)?;
    }

    if let Some(image) = config.resolved_og_image(slug) {
        if is_named(element, "property", "og:image") || is_named(element, "name", "twitter:image") {
            element.set_attribute("content", image)?;
        }
    }

    if is_named(element, "property", "og:url") || is_named(element, "name", "twitter:url") {
        element.set_attribute("content", &config.canonical_url(slug))?;
    }

    if is_named(element, "name", "apple-itunes-app") {
        element.remove();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::config::{SiteConfig, SiteSettings, SlugEntry};
    use crate::html::{rewrite_str, PageRewriter};
    use crate::models::{BrandingOptions, PageMetadata};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn config() -> Arc<SiteConfig> {
        let mut page_metadata = HashMap::new();
        page_metadata.insert(
            "about".to_string(),
            PageMetadata {
                title: Some("About Acme".to_string()),
                description: None,
                og_image: Some("https://cdn.example.com/about.png".to_string()),
            },
        );
        let settings = SiteSettings {
            domain: "example.com".to_string(),
            site_url: "a".repeat(32),
            slugs: vec![SlugEntry {
                slug: "about".to_string(),
                page_url: "b".repeat(32),
            }],
            page_title: "Acme".to_string(),
            page_description: "Docs for Acme".to_string(),
            page_metadata,
            branding: BrandingOptions {
                brand_replacement: Some("Acme".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        Arc::new(SiteConfig::from_settings(settings).unwrap())
    }

    fn rewrite(slug: &str, html: &str) -> String {
        rewrite_str(&PageRewriter::new(config(), slug), html).unwrap()
    }

    #[test]
    fn test_removes_noindex_and_itunes() {
        let output = rewrite(
            "",
            r#"<meta name="robots" content="noindex, nofollow"><meta name="apple-itunes-app" content="app-id=1"><meta name="robots" content="all">"#,
        );
        assert!(!output.contains("noindex"));
        assert!(!output.contains("apple-itunes-app"));
        assert!(output.contains(r#"<meta name="robots" content="all">"#));
    }

    #[test]
    fn test_site_name_falls_back_to_domain() {
        let output = rewrite("", r#"<meta property="og:site_name" content="Notion">"#);
        assert_eq!(output, r#"<meta property="og:site_name" content="example.com">"#);
    }

    #[test]
    fn test_brand_replacement() {
        let output = rewrite("", r#"<meta name="keywords" content="Notion, Notion pages">"#);
        assert_eq!(output, r#"<meta name="keywords" content="Acme, Acme pages">"#);
    }

    #[test]
    fn test_per_slug_overrides() {
        let output = rewrite(
            "about",
            concat!(
                r#"<title>Old</title>"#,
                r#"<meta property="og:title" content="Old">"#,
                r#"<meta name="description" content="Old">"#,
                r#"<meta property="og:image" content="old.png">"#,
                r#"<meta name="twitter:url" content="https://acme.notion.site/x">"#,
            ),
        );
        assert!(output.contains("<title>About Acme</title>"));
        assert!(output.contains(r#"<meta property="og:title" content="About Acme">"#));
        assert!(output.contains(r#"<meta name="description" content="Docs for Acme">"#));
        assert!(output
            .contains(r#"<meta property="og:image" content="https://cdn.example.com/about.png">"#));
        assert!(
            output.contains(r#"<meta name="twitter:url" content="https://example.com/about">"#)
        );
    }

    #[test]
    fn test_root_keeps_image_and_uses_bare_domain() {
        let output = rewrite(
            "",
            r#"<meta property="og:image" content="old.png"><meta property="og:url" content="x">"#,
        );
        assert!(output.contains(r#"content="old.png""#));
        assert!(output.contains(r#"<meta property="og:url" content="https://example.com">"#));
    }

    #[test]
    fn test_empty_title_leaves_element() {
        let settings = SiteSettings {
            domain: "example.com".to_string(),
            site_url: "a".repeat(32),
            ..Default::default()
        };
        let config = Arc::new(SiteConfig::from_settings(settings).unwrap());
        let output =
            rewrite_str(&PageRewriter::new(config, ""), "<title>Original</title>").unwrap();
        assert_eq!(output, "<title>Original</title>");
    }
}
