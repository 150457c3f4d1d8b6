//! HTTP/1.1 server
//!
//! Accepts connections on `server.listen_address` and serves each one on its
//! own task with a shared [`SiteProxy`].

use crate::config::SiteConfig;
use crate::error::{ProxyError, Result};
use crate::proxy::SiteProxy;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Accept loop around a shared SiteProxy
pub struct ProxyServer {
    proxy: SiteProxy,
    listen_address: String,
}

impl ProxyServer {
    /// Create a new ProxyServer for the given configuration
    pub fn new(config: Arc<SiteConfig>) -> Result<Self> {
        let listen_address = config.server.listen_address.clone();
        let proxy = SiteProxy::new(config)?;
        Ok(ProxyServer {
            proxy,
            listen_address,
        })
    }

    pub fn proxy(&self) -> &SiteProxy {
        &self.proxy
    }

    /// Bind `server.listen_address` and serve until the task is dropped
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let addr: SocketAddr = self.listen_address.parse().map_err(|e| {
            ProxyError::config(format!("Invalid listen_address {}: {}", self.listen_address, e))
        })?;
        let listener = TcpListener::bind(addr).await?;
        info!("Proxy listening on http://{}", addr);
        self.serve(listener).await
    }

    /// Serve connections from an already bound listener
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> Result<()> {
        loop {
            let (stream, peer) = listener.accept().await?;
            debug!("Accepted connection: peer={}", peer);
            let io = TokioIo::new(stream);
            let server = self.clone();

            tokio::task::spawn(async move {
                let result = http1::Builder::new()
                    .serve_connection(
                        io,
                        service_fn(move |req| {
                            let server = server.clone();
                            async move { Ok::<_, Infallible>(server.proxy.handle(req).await) }
                        }),
                    )
                    .await;

                if let Err(err) = result {
                    error!("Error serving connection: peer={}: {:?}", peer, err);
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(listen_address: &str) -> Arc<SiteConfig> {
        let mut config = SiteConfig::new("example.com", &"a".repeat(32)).unwrap();
        config.server.listen_address = listen_address.to_string();
        Arc::new(config)
    }

    #[tokio::test]
    async fn test_invalid_listen_address() {
        let server = Arc::new(ProxyServer::new(config("not-an-address")).unwrap());
        let err = server.run().await.unwrap_err();
        assert!(matches!(err, ProxyError::ConfigValidation(_)));
    }

    #[tokio::test]
    async fn test_serves_robots() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = Arc::new(ProxyServer::new(config("127.0.0.1:0")).unwrap());
        tokio::spawn(server.serve(listener));

        let body = reqwest::get(format!("http://{}/robots.txt", addr))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "Sitemap: https://example.com/sitemap.xml");
    }
}
