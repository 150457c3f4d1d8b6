//! `sitemap.xml` and `robots.txt` generation

use crate::config::SiteConfig;
use html_escape::encode_text;

pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// One `<url><loc>…</loc></url>` entry per indexed slug, root included
pub fn generate_sitemap(config: &SiteConfig) -> String {
    let mut sitemap = format!(r#"<urlset xmlns="{}">"#, SITEMAP_NAMESPACE);
    for slug in config.slug_index.slugs() {
        sitemap.push_str("<url><loc>https://");
        sitemap.push_str(&config.domain);
        sitemap.push('/');
        sitemap.push_str(&encode_text(slug));
        sitemap.push_str("</loc></url>");
    }
    sitemap.push_str("</urlset>");
    sitemap
}

/// Single `Sitemap:` line pointing at the generated sitemap
pub fn generate_robots(config: &SiteConfig) -> String {
    format!("Sitemap: https://{}/sitemap.xml", config.domain)
}
