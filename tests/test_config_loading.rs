use std::io::Write;
use tempfile::NamedTempFile;
use worknot_proxy::{ProxyError, SchemaType, SiteConfig};

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_example_config() {
    let config = SiteConfig::from_file("worknot_proxy.yaml");
    assert!(config.is_ok(), "Failed to load example config: {:?}", config.err());

    let config = config.unwrap();
    assert_eq!(config.domain, "example.com");
    assert_eq!(config.upstream_site_host, "acme.notion.site");
    assert_eq!(config.upstream_base_url, "https://acme.notion.site");
    assert_eq!(config.slug_index.len(), 3);
    assert_eq!(
        config.slug_index.resolve_slug("blog"),
        Some("00112233445566778899aabbccddeeff")
    );
    assert_eq!(config.structured_data.schema_type, SchemaType::Organization);
    assert_eq!(
        config.custom_404_page_id.as_deref(),
        Some("ffeeddccbbaa99887766554433221100")
    );
    assert_eq!(config.subdomain_redirects["www"], "https://example.com");
    assert!(config.image.is_enabled());
    assert_eq!(config.resolved_title("about"), "About Acme");
    assert_eq!(config.resolved_title("blog"), "Acme");
}

#[test]
fn test_load_minimal_config() {
    let file = write_config(
        r#"
domain: "https://Docs.Example.com/"
site_url: "https://acme.notion.site/0123456789abcdef0123456789abcdef"
"#,
    );

    let config = SiteConfig::from_file(file.path()).unwrap();
    assert_eq!(config.domain, "docs.example.com");
    assert_eq!(config.server.listen_address, "0.0.0.0:8080");
    assert_eq!(config.slug_index.len(), 1);
    assert!(config.custom_404_page_id.is_none());
    assert!(config.upstream_timeout().is_none());
    assert!(!config.image.is_enabled());
}

#[test]
fn test_invalid_entries_are_dropped() {
    let file = write_config(
        r#"
domain: "example.com"
site_url: "0123456789abcdef0123456789abcdef"
slugs:
  - slug: ""
    page_url: "fedcba9876543210fedcba9876543210"
  - slug: "short"
    page_url: "not-a-page"
  - slug: "ok"
    page_url: "fedcba9876543210fedcba9876543210"
subdomain_redirects:
  - subdomain: ""
    redirect_url: "https://ignored.example"
"#,
    );

    let config = SiteConfig::from_file(file.path()).unwrap();
    assert_eq!(config.slug_index.slugs().collect::<Vec<_>>(), vec!["", "ok"]);
    assert!(config.subdomain_redirects.is_empty());
}

#[test]
fn test_config_errors_are_fatal() {
    let cases = [
        "domain: \"\"\nsite_url: \"0123456789abcdef0123456789abcdef\"",
        "domain: \"example.com\"\nsite_url: \"https://acme.notion.site/Home\"",
        "domain: \"example.com\"\nsite_url: \"0123456789abcdef0123456789abcdef\"\ncustom_404:\n  page_url: \"missing\"",
        "domain: \"example.com\"\nsite_url: \"0123456789abcdef0123456789abcdef\"\nsubdomain_redirects:\n  - subdomain: \"www\"\n    redirect_url: \"example.org\"",
        "domain: \"example.com\"\nsite_url: \"0123456789abcdef0123456789abcdef\"\nimage:\n  quality: 0",
    ];

    for yaml in cases {
        let file = write_config(yaml);
        match SiteConfig::from_file(file.path()) {
            Err(ProxyError::ConfigValidation(_)) => {}
            other => panic!("expected ConfigValidation for {:?}, got {:?}", yaml, other),
        }
    }
}

#[test]
fn test_missing_file() {
    let result = SiteConfig::from_file("/nonexistent/worknot_proxy.yaml");
    assert!(matches!(result, Err(ProxyError::ConfigValidation(_))));
}
