// Property: title uniqueness
//
// For any document with a <title> element and a non-empty resolved title,
// the rewritten document contains exactly one <title> element whose text is
// the resolved title.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use worknot_proxy::html::rewrite_str;
use worknot_proxy::{PageMetadata, PageRewriter, SiteConfig, SiteSettings, SlugEntry};

fn config(default_title: &str, about_title: Option<String>) -> Arc<SiteConfig> {
    let mut page_metadata = HashMap::new();
    page_metadata.insert(
        "about".to_string(),
        PageMetadata {
            title: about_title,
            ..Default::default()
        },
    );
    let settings = SiteSettings {
        domain: "example.com".to_string(),
        site_url: "a".repeat(32),
        slugs: vec![SlugEntry {
            slug: "about".to_string(),
            page_url: "b".repeat(32),
        }],
        page_title: default_title.to_string(),
        page_metadata,
        ..Default::default()
    };
    Arc::new(SiteConfig::from_settings(settings).unwrap())
}

fn title_text(html: &str) -> Option<&str> {
    let start = html.find("<title>")? + "<title>".len();
    let end = html[start..].find("</title>")? + start;
    Some(&html[start..end])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_single_resolved_title(
        default_title in "[A-Za-z][A-Za-z0-9 ]{0,30}",
        about_title in prop::option::of("[A-Za-z][A-Za-z0-9 ]{0,30}"),
        original in "[A-Za-z0-9 ]{0,30}",
        about in any::<bool>(),
    ) {
        let config = config(&default_title, about_title.clone());
        let slug = if about { "about" } else { "" };
        let expected = match (&about_title, about) {
            (Some(title), true) => title.clone(),
            _ => default_title.clone(),
        };

        let document = format!(
            "<html><head><meta charset=\"utf-8\"><title>{}</title></head><body><p>x</p></body></html>",
            original
        );
        let output = rewrite_str(&PageRewriter::new(config, slug), &document).unwrap();

        prop_assert_eq!(output.matches("<title>").count(), 1);
        prop_assert_eq!(title_text(&output), Some(expected.as_str()));
    }
}
