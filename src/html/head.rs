//! Head unit: markup appended to `<head>`
//!
//! Blocks are appended in a fixed order: canonical link, robots meta,
//! favicons, analytics, Twitter meta, AI attribution, JSON-LD, font, and
//! the chrome-hiding stylesheet.

use crate::config::SiteConfig;
use crate::html::script_safe_json;
use crate::models::{non_empty, SchemaType};
use html_escape::encode_double_quoted_attribute;
use serde_json::{json, Value};

/// Hides the upstream top-bar controls and shows the theme toggle slot
pub const TOPBAR_CSS: &str = r#"<style>
div.notion-topbar > div > div:nth-child(3) { display: none !important; }
div.notion-topbar > div > div:nth-child(4) { display: none !important; }
div.notion-topbar > div > div:nth-child(5) { display: none !important; }
div.notion-topbar > div > div:nth-child(6) { display: none !important; }
div.notion-topbar-mobile > div:nth-child(3) { display: none !important; }
div.notion-topbar-mobile > div:nth-child(4) { display: none !important; }
div.notion-topbar > div > div:nth-child(1n).toggle-mode { display: block !important; }
div.notion-topbar-mobile > div:nth-child(1n).toggle-mode { display: block !important; }
</style>"#;

/// Everything appended to `<head>` for the page bound to `slug`
pub fn head_markup(config: &SiteConfig, slug: &str) -> String {
    let canonical = config.canonical_url(slug);
    let mut html = String::new();

    html.push_str(&format!(
        r#"<link rel="canonical" href="{}">"#,
        encode_double_quoted_attribute(&canonical)
    ));
    html.push_str(r#"<meta name="robots" content="index, follow">"#);

    if let Some(favicon) = non_empty(&config.branding.favicon_url) {
        let favicon = encode_double_quoted_attribute(favicon);
        html.push_str(&format!(r#"<link rel="icon" href="{}" type="image/x-icon">"#, favicon));
        html.push_str(&format!(
            r#"<link rel="shortcut icon" href="{}" type="image/x-icon">"#,
            favicon
        ));
        html.push_str(&format!(r#"<link rel="apple-touch-icon" href="{}">"#, favicon));
    }

    if let Some(tag_id) = non_empty(&config.analytics.google_tag_id) {
        html.push_str(&google_tag_snippet(tag_id));
    }
    if let Some(pixel_id) = non_empty(&config.analytics.facebook_pixel_id) {
        html.push_str(&facebook_pixel_snippet(pixel_id));
    }

    if let Some(handle) = non_empty(&config.branding.twitter_handle) {
        let handle = encode_double_quoted_attribute(handle);
        html.push_str(&format!(r#"<meta name="twitter:site" content="{}">"#, handle));
        html.push_str(&format!(r#"<meta name="twitter:creator" content="{}">"#, handle));
    }

    if let Some(attribution) = non_empty(&config.seo.ai_attribution) {
        html.push_str(&format!(
            r#"<meta name="ai:source_url" content="{}">"#,
            encode_double_quoted_attribute(&canonical)
        ));
        html.push_str(&format!(
            r#"<meta name="ai:source_attribution" content="{}">"#,
            encode_double_quoted_attribute(attribution)
        ));
    }

    if config.structured_data.enabled {
        let data = structured_data(config, slug);
        html.push_str(&format!(
            r#"<script type="application/ld+json">{}</script>"#,
            script_safe_json(&data.to_string())
        ));
    }

    if !config.google_font.is_empty() {
        html.push_str(&google_font_markup(&config.google_font));
    }

    html.push_str(TOPBAR_CSS);
    html
}

/// JSON-LD object for the page bound to `slug`
///
/// WebPage and Article carry the organization as a nested `publisher`;
/// Organization puts its name and logo at the top level.
pub fn structured_data(config: &SiteConfig, slug: &str) -> Value {
    let options = &config.structured_data;
    let organization = non_empty(&options.organization_name).unwrap_or(config.domain.as_str());
    let logo = non_empty(&options.logo_url);

    let mut data = json!({
        "@context": "https://schema.org",
        "@type": options.schema_type.as_str(),
        "name": config.resolved_title(slug),
        "description": config.resolved_description(slug),
        "url": config.canonical_url(slug),
    });

    if options.schema_type.has_publisher() {
        let mut publisher = json!({
            "@type": "Organization",
            "name": organization,
            "url": format!("https://{}", config.domain),
        });
        if let Some(logo) = logo {
            publisher["logo"] = json!({ "@type": "ImageObject", "url": logo });
        }
        data["publisher"] = publisher;
    }

    if options.schema_type == SchemaType::Organization {
        data["name"] = json!(organization);
        if let Some(logo) = logo {
            data["logo"] = json!(logo);
        }
    }

    data
}

fn google_tag_snippet(tag_id: &str) -> String {
    format!(
        r#"<script async src="https://www.googletagmanager.com/gtag/js?id={attr}"></script>
<script>
  window.dataLayer = window.dataLayer || [];
  function gtag(){{dataLayer.push(arguments);}}
  gtag('js', new Date());
  gtag('config', '{id}');
</script>"#,
        attr = encode_double_quoted_attribute(tag_id),
        id = tag_id
    )
}

fn facebook_pixel_snippet(pixel_id: &str) -> String {
    format!(
        r#"<script>
  !function(f,b,e,v,n,t,s)
  {{if(f.fbq)return;n=f.fbq=function(){{n.callMethod?
  n.callMethod.apply(n,arguments):n.queue.push(arguments)}};
  if(!f._fbq)f._fbq=n;n.push=n;n.loaded=!0;n.version='2.0';
  n.queue=[];t=b.createElement(e);t.async=!0;
  t.src=v;s=b.getElementsByTagName(e)[0];
  s.parentNode.insertBefore(t,s)}}(window, document,'script',
  'https://connect.facebook.net/en_US/fbevents.js');
  fbq('init', '{id}');
  fbq('track', 'PageView');
</script>
<noscript><img height="1" width="1" style="display:none"
  src="https://www.facebook.com/tr?id={attr}&amp;ev=PageView&amp;noscript=1"
/></noscript>"#,
        id = pixel_id,
        attr = encode_double_quoted_attribute(pixel_id)
    )
}

fn google_font_markup(font: &str) -> String {
    format!(
        r#"<link href="https://fonts.googleapis.com/css?family={family}:Regular,Bold,Italic&amp;display=swap" rel="stylesheet">
<style>* {{ font-family: "{font}" !important; }}</style>"#,
        family = encode_double_quoted_attribute(&font.replace(' ', "+")),
        font = font
    )
}
