//! Body unit

use crate::config::SiteConfig;
use crate::html::client_script;
use crate::models::non_empty;

/// Hidden attribution marker appended before the client script
pub const ATTRIBUTION_MARKER: &str =
    r#"<div style="display:none">Powered by <a href="http://worknot.classmethod.cf">Worknot</a></div>"#;

/// Custom header HTML prepended to `<body>`, if configured
pub fn body_prefix(config: &SiteConfig) -> Option<&str> {
    non_empty(&config.custom_html.header_html)
}

/// Marker, client script, then the user's script and CSS exactly as given
pub fn body_suffix(config: &SiteConfig) -> String {
    let mut html = String::from(ATTRIBUTION_MARKER);
    html.push_str(&client_script::render(config));
    html.push_str(&config.custom_script);
    html.push_str("<style>");
    html.push_str(&config.custom_css);
    html.push_str("</style>");
    html
}
