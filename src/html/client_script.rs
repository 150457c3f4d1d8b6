//! Inline script injected at the end of `<body>`
//!
//! The single-page client keeps working with page IDs while the address bar
//! shows slugs. The script overrides `window.CONFIG.domainBaseUrl`, rebuilds
//! the slug table, wraps `history.pushState`/`replaceState`, and points
//! `XMLHttpRequest.open` back at the upstream host. Its text is an external
//! contract with the hosted client runtime and is emitted as-is.

use crate::body_rewriter::GENERIC_UPSTREAM_HOST;
use crate::config::SiteConfig;
use crate::html::script_safe_json;

const DOMAIN_PLACEHOLDER: &str = "__PROXY_DOMAIN__";
const SLUG_TABLE_PLACEHOLDER: &str = "__PROXY_SLUG_TO_PAGE__";
const UPSTREAM_PLACEHOLDER: &str = "__PROXY_UPSTREAM_HOST__";

const LIGHT_TOGGLE: &str = r#"<div title="Change to Dark Mode" style="margin-left: auto; margin-right: 14px; min-width: 0px;"><div role="button" tabindex="0" style="user-select: none; transition: background 120ms ease-in 0s; cursor: pointer; border-radius: 44px;"><div style="display: flex; flex-shrink: 0; height: 14px; width: 26px; border-radius: 44px; padding: 2px; box-sizing: content-box; background: rgba(135, 131, 120, 0.3); transition: background 200ms ease 0s, box-shadow 200ms ease 0s;"><div style="width: 14px; height: 14px; border-radius: 44px; background: white; transition: transform 200ms ease-out 0s, background 200ms ease-out 0s; transform: translateX(0px) translateY(0px);"></div></div></div></div>"#;

const DARK_TOGGLE: &str = r#"<div title="Change to Light Mode" style="margin-left: auto; margin-right: 14px; min-width: 0px;"><div role="button" tabindex="0" style="user-select: none; transition: background 120ms ease-in 0s; cursor: pointer; border-radius: 44px;"><div style="display: flex; flex-shrink: 0; height: 14px; width: 26px; border-radius: 44px; padding: 2px; box-sizing: content-box; background: rgb(46, 170, 220); transition: background 200ms ease 0s, box-shadow 200ms ease 0s;"><div style="width: 14px; height: 14px; border-radius: 44px; background: white; transition: transform 200ms ease-out 0s, background 200ms ease-out 0s; transform: translateX(12px) translateY(0px);"></div></div></div></div>"#;

const TEMPLATE: &str = r#"<script>
window.CONFIG.domainBaseUrl = 'https://__PROXY_DOMAIN__';
const SLUG_TO_PAGE = __PROXY_SLUG_TO_PAGE__;
const PAGE_TO_SLUG = {};
const slugs = [];
const pages = [];
const el = document.createElement('div');
let redirected = false;
Object.keys(SLUG_TO_PAGE).forEach(slug => {
  const page = SLUG_TO_PAGE[slug];
  slugs.push(slug);
  pages.push(page);
  PAGE_TO_SLUG[page] = slug;
});
function getPage() {
  return location.pathname.slice(-32);
}
function getSlug() {
  return location.pathname.slice(1);
}
function updateSlug() {
  const slug = PAGE_TO_SLUG[getPage()];
  if (slug != null) {
    history.replaceState(history.state, '', '/' + slug);
  }
}
function onDark() {
  el.innerHTML = '__PROXY_DARK_TOGGLE__';
  document.body.classList.add('dark');
  __console.environment.ThemeStore.setState({ mode: 'dark' });
};
function onLight() {
  el.innerHTML = '__PROXY_LIGHT_TOGGLE__';
  document.body.classList.remove('dark');
  __console.environment.ThemeStore.setState({ mode: 'light' });
}
function toggle() {
  if (document.body.classList.contains('dark')) {
    onLight();
  } else {
    onDark();
  }
}
function addDarkModeButton(device) {
  const nav = device === 'web' ? document.querySelector('.notion-topbar').firstChild : document.querySelector('.notion-topbar-mobile');
  el.className = 'toggle-mode';
  el.addEventListener('click', toggle);
  nav.appendChild(el);
  onLight();
}
const observer = new MutationObserver(function() {
  if (redirected) return;
  const nav = document.querySelector('.notion-topbar');
  const mobileNav = document.querySelector('.notion-topbar-mobile');
  if (nav && nav.firstChild && nav.firstChild.firstChild
    || mobileNav && mobileNav.firstChild) {
    redirected = true;
    updateSlug();
    addDarkModeButton(nav ? 'web' : 'mobile');
    const onpopstate = window.onpopstate;
    window.onpopstate = function() {
      if (slugs.includes(getSlug())) {
        const page = SLUG_TO_PAGE[getSlug()];
        if (page) {
          history.replaceState(history.state, 'bypass', '/' + page);
        }
      }
      onpopstate.apply(this, [].slice.call(arguments));
      updateSlug();
    };
  }
});
observer.observe(document.querySelector('#notion-app'), {
  childList: true,
  subtree: true,
});
const replaceState = window.history.replaceState;
window.history.replaceState = function(state) {
  if (arguments[1] !== 'bypass' && slugs.includes(getSlug())) return;
  return replaceState.apply(window.history, arguments);
};
const pushState = window.history.pushState;
window.history.pushState = function(state) {
  const dest = new URL(location.protocol + location.host + arguments[2]);
  const id = dest.pathname.slice(-32);
  if (pages.includes(id)) {
    arguments[2] = '/' + PAGE_TO_SLUG[id];
  }
  return pushState.apply(window.history, arguments);
};
const open = window.XMLHttpRequest.prototype.open;
window.XMLHttpRequest.prototype.open = function() {
  arguments[1] = arguments[1].replace('__PROXY_DOMAIN__', '__PROXY_UPSTREAM_HOST__');
  return open.apply(this, [].slice.call(arguments));
};
</script>"#;

/// Render the client script for `config`
pub fn render(config: &SiteConfig) -> String {
    let table = script_safe_json(&config.slug_index.to_json_object().to_string());
    TEMPLATE
        .replace("__PROXY_DARK_TOGGLE__", DARK_TOGGLE)
        .replace("__PROXY_LIGHT_TOGGLE__", LIGHT_TOGGLE)
        .replace(UPSTREAM_PLACEHOLDER, GENERIC_UPSTREAM_HOST)
        .replace(DOMAIN_PLACEHOLDER, &config.domain)
        .replace(SLUG_TABLE_PLACEHOLDER, &table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SiteSettings, SlugEntry};

    fn config() -> SiteConfig {
        SiteConfig::from_settings(SiteSettings {
            domain: "example.com".to_string(),
            site_url: "a".repeat(32),
            slugs: vec![SlugEntry {
                slug: "about".to_string(),
                page_url: "b".repeat(32),
            }],
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_interception_points() {
        let script = render(&config());
        assert!(script.contains("window.CONFIG.domainBaseUrl = 'https://example.com';"));
        assert!(script.contains(&format!(
            r#"const SLUG_TO_PAGE = {{"":"{}","about":"{}"}};"#,
            "a".repeat(32),
            "b".repeat(32)
        )));
        assert!(script.contains("window.history.pushState = function(state)"));
        assert!(script.contains("window.history.replaceState = function(state)"));
        assert!(script
            .contains("arguments[1] = arguments[1].replace('example.com', 'www.notion.so');"));
    }

    #[test]
    fn test_slug_text_is_not_substituted() {
        let config = SiteConfig::from_settings(SiteSettings {
            domain: "example.com".to_string(),
            site_url: "a".repeat(32),
            slugs: vec![SlugEntry {
                slug: "__PROXY_DOMAIN__-__PROXY_UPSTREAM_HOST__".to_string(),
                page_url: "b".repeat(32),
            }],
            ..Default::default()
        })
        .unwrap();
        let script = render(&config);
        assert!(script.contains(&format!(
            r#""__PROXY_DOMAIN__-__PROXY_UPSTREAM_HOST__":"{}""#,
            "b".repeat(32)
        )));
    }

    #[test]
    fn test_no_placeholders_left() {
        let script = render(&config());
        assert!(!script.contains("__PROXY_"));
        assert!(script.contains("Change to Dark Mode"));
        assert!(script.contains("Change to Light Mode"));
    }
}
