//! Streaming HTML rewrite pipeline
//!
//! Documents are rewritten in a single forward pass with `lol_html`. Each
//! element of interest is handed to a [`DocumentVisitor`] exactly once, in
//! document order, before its children are emitted. [`PageRewriter`] is the
//! visitor used for proxied pages; it is built per request from the shared
//! configuration and the slug the page resolves to.
//!
//! Streamed documents are rewritten inside the response body itself: every
//! upstream chunk is fed to a `Send` rewriter as the client polls for the
//! next frame, and whatever the rewriter has emitted so far becomes that
//! frame. Nothing waits on the upstream outside the body's own poll.

pub mod body;
pub mod client_script;
pub mod head;
pub mod link;
pub mod meta;

use crate::config::SiteConfig;
use crate::error::{ProxyError, Result};
use crate::response::ProxyBody;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use lol_html::html_content::ContentType;
use lol_html::send::{Element, HtmlRewriter, Settings};
use lol_html::{element, HandlerResult, OutputSink};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// One callback per element of interest
///
/// Every method defaults to leaving the element untouched.
pub trait DocumentVisitor {
    fn title(&self, _element: &mut Element<'_, '_>) -> HandlerResult {
        Ok(())
    }

    fn meta(&self, _element: &mut Element<'_, '_>) -> HandlerResult {
        Ok(())
    }

    fn link(&self, _element: &mut Element<'_, '_>) -> HandlerResult {
        Ok(())
    }

    fn head(&self, _element: &mut Element<'_, '_>) -> HandlerResult {
        Ok(())
    }

    fn body(&self, _element: &mut Element<'_, '_>) -> HandlerResult {
        Ok(())
    }

    /// Label used in log lines about this document
    fn label(&self) -> &str {
        ""
    }
}

impl<V: DocumentVisitor + ?Sized> DocumentVisitor for &V {
    fn title(&self, element: &mut Element<'_, '_>) -> HandlerResult {
        (**self).title(element)
    }

    fn meta(&self, element: &mut Element<'_, '_>) -> HandlerResult {
        (**self).meta(element)
    }

    fn link(&self, element: &mut Element<'_, '_>) -> HandlerResult {
        (**self).link(element)
    }

    fn head(&self, element: &mut Element<'_, '_>) -> HandlerResult {
        (**self).head(element)
    }

    fn body(&self, element: &mut Element<'_, '_>) -> HandlerResult {
        (**self).body(element)
    }

    fn label(&self) -> &str {
        (**self).label()
    }
}

impl<V: DocumentVisitor + ?Sized> DocumentVisitor for Arc<V> {
    fn title(&self, element: &mut Element<'_, '_>) -> HandlerResult {
        (**self).title(element)
    }

    fn meta(&self, element: &mut Element<'_, '_>) -> HandlerResult {
        (**self).meta(element)
    }

    fn link(&self, element: &mut Element<'_, '_>) -> HandlerResult {
        (**self).link(element)
    }

    fn head(&self, element: &mut Element<'_, '_>) -> HandlerResult {
        (**self).head(element)
    }

    fn body(&self, element: &mut Element<'_, '_>) -> HandlerResult {
        (**self).body(element)
    }

    fn label(&self) -> &str {
        (**self).label()
    }
}

/// Visitor applying the Title/Meta, Link, Head and Body units for one page
#[derive(Debug, Clone)]
pub struct PageRewriter {
    config: Arc<SiteConfig>,
    slug: String,
}

impl PageRewriter {
    pub fn new(config: Arc<SiteConfig>, slug: impl Into<String>) -> Self {
        PageRewriter {
            config,
            slug: slug.into(),
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }
}

impl DocumentVisitor for PageRewriter {
    fn title(&self, element: &mut Element<'_, '_>) -> HandlerResult {
        meta::rewrite_title(&self.config, &self.slug, element);
        Ok(())
    }

    fn meta(&self, element: &mut Element<'_, '_>) -> HandlerResult {
        meta::rewrite_meta(&self.config, &self.slug, element)
    }

    fn link(&self, element: &mut Element<'_, '_>) -> HandlerResult {
        link::rewrite_link(&self.config, element);
        Ok(())
    }

    fn head(&self, element: &mut Element<'_, '_>) -> HandlerResult {
        element.append(&head::head_markup(&self.config, &self.slug), ContentType::Html);
        Ok(())
    }

    fn body(&self, element: &mut Element<'_, '_>) -> HandlerResult {
        if let Some(header) = body::body_prefix(&self.config) {
            element.prepend(header, ContentType::Html);
        }
        element.append(&body::body_suffix(&self.config), ContentType::Html);
        Ok(())
    }

    fn label(&self) -> &str {
        &self.slug
    }
}

/// Build a `Send` `HtmlRewriter` dispatching to `visitor`
pub fn build_rewriter<'h, V, O>(visitor: V, output: O) -> HtmlRewriter<'h, O>
where
    V: DocumentVisitor + Clone + Send + 'h,
    O: OutputSink,
{
    let (title, meta, link, head, body) = (
        visitor.clone(),
        visitor.clone(),
        visitor.clone(),
        visitor.clone(),
        visitor,
    );
    HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                element!("title", move |el: &mut Element<'_, '_>| title.title(el)),
                element!("meta", move |el: &mut Element<'_, '_>| meta.meta(el)),
                element!("link", move |el: &mut Element<'_, '_>| link.link(el)),
                element!("head", move |el: &mut Element<'_, '_>| head.head(el)),
                element!("body", move |el: &mut Element<'_, '_>| body.body(el)),
            ],
            strict: false,
            ..Settings::new_send()
        },
        output,
    )
}

/// Rewrite a complete document held in memory
pub fn rewrite_str<V: DocumentVisitor + Sync>(visitor: &V, html: &str) -> Result<String> {
    let mut output = Vec::with_capacity(html.len());
    {
        let mut rewriter = build_rewriter(visitor, |chunk: &[u8]| output.extend_from_slice(chunk));
        rewriter
            .write(html.as_bytes())
            .map_err(|e| ProxyError::Rewrite(e.to_string()))?;
        rewriter.end().map_err(|e| ProxyError::Rewrite(e.to_string()))?;
    }
    String::from_utf8(output).map_err(|e| ProxyError::Rewrite(e.to_string()))
}

/// Rewrite a streamed document, returning the rewritten response body
///
/// Upstream errors are forwarded to the body after everything received
/// before them. Dropping the body drops the upstream stream with it.
pub fn transform_stream<V, S>(visitor: V, upstream: S) -> ProxyBody
where
    V: DocumentVisitor + Send + Sync + 'static,
    S: Stream<Item = Result<Bytes>> + Send + 'static,
{
    let frames = futures::stream::unfold(StreamRewrite::new(visitor, upstream), |mut state| {
        async move { state.next_chunk().await.map(|item| (item.map(Frame::data), state)) }
    });
    StreamBody::new(frames).boxed_unsync()
}

type SharedBuffer = Arc<Mutex<Vec<u8>>>;
type BufferSink = Box<dyn FnMut(&[u8]) + Send>;

/// Per-response rewrite state driven by the body's poll
struct StreamRewrite {
    upstream: BoxStream<'static, Result<Bytes>>,
    rewriter: Option<HtmlRewriter<'static, BufferSink>>,
    output: SharedBuffer,
    label: String,
    finished: bool,
}

impl StreamRewrite {
    fn new<V, S>(visitor: V, upstream: S) -> Self
    where
        V: DocumentVisitor + Send + Sync + 'static,
        S: Stream<Item = Result<Bytes>> + Send + 'static,
    {
        let label = visitor.label().to_string();
        let output = SharedBuffer::default();
        let sink_output = Arc::clone(&output);
        let sink: BufferSink = Box::new(move |chunk: &[u8]| {
            if let Ok(mut buffer) = sink_output.lock() {
                buffer.extend_from_slice(chunk);
            }
        });

        StreamRewrite {
            upstream: upstream.boxed(),
            rewriter: Some(build_rewriter(Arc::new(visitor), sink)),
            output,
            label,
            finished: false,
        }
    }

    /// Next non-empty piece of output, `None` once the document is done
    async fn next_chunk(&mut self) -> Option<Result<Bytes>> {
        while !self.finished {
            match self.upstream.next().await {
                Some(Ok(chunk)) => {
                    let out = self.write(chunk);
                    if !out.is_empty() {
                        return Some(Ok(out));
                    }
                }
                Some(Err(e)) => {
                    warn!("Upstream body failed mid-document: slug={}: {}", self.label, e);
                    self.finished = true;
                    self.rewriter = None;
                    return Some(Err(e));
                }
                None => {
                    self.finished = true;
                    let out = self.end();
                    if !out.is_empty() {
                        return Some(Ok(out));
                    }
                }
            }
        }
        None
    }

    fn write(&mut self, chunk: Bytes) -> Bytes {
        let Some(rewriter) = self.rewriter.as_mut() else {
            return chunk;
        };
        match rewriter.write(&chunk) {
            Ok(()) => self.drain(),
            Err(e) => {
                warn!(
                    "HTML rewrite failed, passing the rest of the document through: slug={}: {}",
                    self.label, e
                );
                self.rewriter = None;
                let mut out = self.drain().to_vec();
                out.extend_from_slice(&chunk);
                Bytes::from(out)
            }
        }
    }

    fn end(&mut self) -> Bytes {
        if let Some(rewriter) = self.rewriter.take() {
            if let Err(e) = rewriter.end() {
                warn!("HTML rewrite failed at end of document: slug={}: {}", self.label, e);
            }
        }
        debug!("Finished HTML rewrite: slug={}", self.label);
        self.drain()
    }

    fn drain(&self) -> Bytes {
        match self.output.lock() {
            Ok(mut buffer) => Bytes::from(std::mem::take(&mut *buffer)),
            Err(_) => Bytes::new(),
        }
    }
}

/// Make serialized JSON safe to embed in a `<script>` element
pub(crate) fn script_safe_json(json: &str) -> String {
    json.replace("</", "<\\/")
}
