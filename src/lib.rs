//! Worknot Proxy
//!
//! A reverse proxy that serves a site hosted on a public page provider under a
//! custom domain. Requests are classified, forwarded to the provider, and the
//! responses are rewritten so that the site reads as if it lived on the custom
//! domain: hostnames in API bodies and scripts are substituted, HTML pages get
//! their metadata, SEO tags and client-side navigation script injected in a
//! single streaming pass, and friendly slugs map onto the provider's page IDs.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use worknot_proxy::{ProxyServer, SiteConfig};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SiteConfig::from_file("worknot_proxy.yaml")?;
//! let server = Arc::new(ProxyServer::new(Arc::new(config))?);
//! server.run().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`SiteConfig`]: immutable configuration, loaded once from YAML
//! - [`SlugIndex`]: bidirectional slug / page ID map
//! - [`RequestRouter`]: classifies each request into a [`Route`]
//! - [`ApiProxy`]: forwards API calls and platform scripts with [`BodyRewriter`]
//! - [`ImageTransform`]: forwards image requests with transform parameters
//! - [`PageRewriter`]: streaming HTML rewrite for proxied pages
//! - [`SiteProxy`]: dispatches a request end to end
//! - [`ProxyServer`]: hyper HTTP/1.1 accept loop
//!
//! # Configuration
//!
//! ```yaml
//! server:
//!   listen_address: "0.0.0.0:8080"
//! domain: "example.com"
//! site_url: "https://acme.notion.site/Home-0123456789abcdef0123456789abcdef"
//! slugs:
//!   - slug: "about"
//!     page_url: "https://acme.notion.site/About-fedcba9876543210fedcba9876543210"
//! page_title: "Acme"
//! page_description: "Everything about Acme"
//! ```

pub mod api_proxy;
pub mod body_rewriter;
pub mod config;
pub mod error;
pub mod html;
pub mod image;
pub mod models;
pub mod proxy;
pub mod redirect;
pub mod response;
pub mod router;
pub mod server;
pub mod sitemap;
pub mod slug_index;
pub mod upstream;

// Re-export commonly used types
pub use api_proxy::ApiProxy;
pub use body_rewriter::BodyRewriter;
pub use config::{ServerSettings, SiteConfig, SiteSettings, SlugEntry};
pub use error::{ProxyError, Result};
pub use html::{DocumentVisitor, PageRewriter};
pub use image::{ImageTransform, ImageTransformOptions};
pub use models::{
    AnalyticsOptions, BrandingOptions, Custom404Options, CustomHtmlOptions, ImageOptions,
    PageMetadata, SchemaType, SeoOptions, StructuredDataOptions, SubdomainRedirect,
};
pub use proxy::SiteProxy;
pub use response::ProxyBody;
pub use router::{ApiKind, RequestRouter, Route};
pub use server::ProxyServer;
pub use slug_index::SlugIndex;
pub use upstream::UpstreamClient;
