//! Subdomain redirects, slug redirects and custom 404 selection

use crate::config::SiteConfig;
use http::StatusCode;

/// Hostname without a `:port` suffix, lowercased
pub fn bare_hostname(host: &str) -> String {
    let without_port = match host.rsplit_once(':') {
        Some((name, port)) if port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    };
    without_port.trim_end_matches('.').to_ascii_lowercase()
}

/// Subdomain label(s) of `host` under the custom domain, if any
///
/// `www.example.com` under `example.com` yields `www`; `a.b.example.com`
/// yields `a.b`. The custom domain itself and unrelated hosts yield `None`.
pub fn subdomain_of(domain: &str, host: &str) -> Option<String> {
    let host = bare_hostname(host);
    let domain_labels = domain.split('.').count();
    let host_labels: Vec<&str> = host.split('.').collect();
    if host_labels.len() <= domain_labels {
        return None;
    }
    let split = host_labels.len() - domain_labels;
    if host_labels[split..].join(".") != domain {
        return None;
    }
    Some(host_labels[..split].join("."))
}

/// Redirect target for a request on a registered subdomain
///
/// The target is the configured base URL followed by the original path and
/// query string.
pub fn resolve_subdomain_redirect(
    config: &SiteConfig,
    host: &str,
    path: &str,
    query: Option<&str>,
) -> Option<String> {
    if config.subdomain_redirects.is_empty() {
        return None;
    }
    let subdomain = subdomain_of(&config.domain, host)?;
    let base = config.subdomain_redirects.get(&subdomain)?;
    let mut location = format!("{}{}", base, path);
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        location.push('?');
        location.push_str(query);
    }
    Some(location)
}

/// Location for a slug → page ID redirect on the custom domain
pub fn slug_redirect_location(config: &SiteConfig, page_id: &str) -> String {
    format!("https://{}/{}", config.domain, page_id)
}

/// Page ID to substitute for a response with `status`, if any
///
/// Only an exact 404 triggers the substitution.
pub fn custom_404_target(config: &SiteConfig, status: StatusCode) -> Option<&str> {
    if status == StatusCode::NOT_FOUND {
        config.custom_404_page_id.as_deref()
    } else {
        None
    }
}
