//! Link unit: drops the upstream favicons when a custom one is configured

use crate::config::SiteConfig;
use crate::models::non_empty;
use lol_html::send::Element;

/// Whether a `rel` value names a favicon-family link
pub fn is_favicon_rel(rel: &str) -> bool {
    rel.contains("icon") || rel == "apple-touch-icon"
}

pub fn rewrite_link(config: &SiteConfig, element: &mut Element<'_, '_>) {
    if non_empty(&config.branding.favicon_url).is_none() {
        return;
    }
    let favicon = element
        .get_attribute("rel")
        .map(|rel| is_favicon_rel(&rel))
        .unwrap_or(false);
    if favicon {
        element.remove();
    }
}
