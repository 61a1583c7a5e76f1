//! The HTML document shell.
//!
//! [`HtmlDocument`] owns one response's chunk queue. Opening it writes the
//! doctype, `<head>` and `<body>` open tag immediately so a browser can
//! start parsing before the page content exists. The page is rendered
//! into [`HtmlDocument::target`] and the document is either finished
//! (closing tags, end of stream) or failed (the transport aborts).

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_core::Stream;
use futures_util::future::BoxFuture;
use futures_util::{FutureExt, StreamExt};
use http::header::{CACHE_CONTROL, CONTENT_TYPE};
use http::{HeaderValue, Response};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use interest_html::{escape, render_content, Content, RenderTarget};
use interest_stream::{ChunkQueue, ChunkStream, Error, Result, Seq};
use tracing::{debug, warn};

use crate::error::ShellResult;

const DOCUMENT_TYPE: &str = "<!DOCTYPE html>";
const HEAD_META: &str =
    r#"<meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1.0">"#;
const HEAD_END: &str = "</head><body";
const BODY_START_END: &str = ">";
const HTML_END: &str = "</body></html>";

/// Response body type for streamed documents.
pub type HtmlBody = BoxBody<Bytes, Error>;

/// What goes around the page.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentOptions {
    pub lang: String,
    /// Written verbatim before `</head>`.
    pub head_content: Option<String>,
    /// Written verbatim inside the `<body>` open tag.
    pub body_attributes: Option<String>,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            lang: "en".to_string(),
            head_content: None,
            body_attributes: None,
        }
    }
}

/// One value of a raw template write.
pub enum TemplateValue {
    Empty,
    Text(String),
    /// Resolved, then written if present.
    Future(BoxFuture<'static, Result<Option<String>>>),
    /// Every item written in order.
    Stream(Seq<String>),
}

impl TemplateValue {
    pub fn future<F>(future: F) -> Self
    where
        F: Future<Output = Result<Option<String>>> + Send + 'static,
    {
        TemplateValue::Future(Box::pin(future))
    }

    pub fn stream<S>(items: S) -> Self
    where
        S: Stream<Item = Result<String>> + Send + 'static,
    {
        TemplateValue::Stream(Box::pin(items))
    }
}

impl From<&str> for TemplateValue {
    fn from(s: &str) -> Self {
        TemplateValue::Text(s.to_string())
    }
}

impl From<String> for TemplateValue {
    fn from(s: String) -> Self {
        TemplateValue::Text(s)
    }
}

impl<T: Into<TemplateValue>> From<Option<T>> for TemplateValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(TemplateValue::Empty, Into::into)
    }
}

/// A streamed HTML document over one chunk queue.
///
/// Clones share the queue; one of them is typically turned into the
/// response while another drives rendering.
#[derive(Clone)]
pub struct HtmlDocument {
    target: RenderTarget,
}

impl HtmlDocument {
    /// Create the queue and write everything up to and including the
    /// `<body>` open tag.
    pub fn open(options: &DocumentOptions, capacity: Option<usize>) -> ShellResult<Self> {
        let chunks = ChunkQueue::with_capacity(capacity);
        chunks.write(DOCUMENT_TYPE.to_string())?;
        chunks.write(format!(
            r#"<html lang="{}"><head>{HEAD_META}"#,
            escape(&options.lang)
        ))?;
        if let Some(head) = options.head_content.as_deref().filter(|h| !h.is_empty()) {
            chunks.write(head.to_string())?;
        }
        chunks.write(HEAD_END.to_string())?;
        if let Some(attrs) = options.body_attributes.as_deref().filter(|a| !a.is_empty()) {
            chunks.write(format!(" {attrs}"))?;
        }
        chunks.write(BODY_START_END.to_string())?;

        Ok(Self {
            target: RenderTarget::new(chunks),
        })
    }

    /// Where the page renders into.
    pub fn target(&self) -> RenderTarget {
        self.target.clone()
    }

    pub fn chunks(&self) -> &ChunkQueue<String> {
        self.target.chunks()
    }

    pub fn is_closed(&self) -> bool {
        self.chunks().is_closed()
    }

    /// Write the closing tags and end the stream. No-op once the document
    /// is closed or failed.
    pub fn finish(&self) {
        let chunks = self.chunks();
        if chunks.is_closed() {
            return;
        }
        if chunks.write(HTML_END.to_string()).is_ok() {
            chunks.close();
        }
    }

    /// Terminate the stream with `err`; the consumer sees the fault after
    /// whatever it already received.
    pub fn fail(&self, err: Error) {
        self.chunks().error(err);
    }

    /// Write literal segments interleaved with values, all unescaped:
    /// `segments[0]`, `values[0]`, `segments[1]`, ...
    ///
    /// Empty segments are skipped. Writes into a closed document are
    /// dropped silently. A fault from a future or stream value is
    /// returned and stops the template.
    pub async fn write_template(&self, segments: &[&str], values: Vec<TemplateValue>) -> Result<()> {
        let mut values = values.into_iter();
        for segment in segments {
            if !segment.is_empty() {
                self.emit(segment.to_string()).await?;
            }
            if let Some(value) = values.next() {
                self.emit_value(value).await?;
            }
        }
        for value in values {
            self.emit_value(value).await?;
        }
        Ok(())
    }

    async fn emit_value(&self, value: TemplateValue) -> Result<()> {
        match value {
            TemplateValue::Empty => Ok(()),
            TemplateValue::Text(text) => self.emit(text).await,
            TemplateValue::Future(future) => match future.await? {
                Some(text) => self.emit(text).await,
                None => Ok(()),
            },
            TemplateValue::Stream(mut items) => {
                while let Some(item) = items.next().await {
                    self.emit(item?).await?;
                }
                Ok(())
            }
        }
    }

    async fn emit(&self, chunk: String) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        match self.target.write(chunk).await {
            Err(Error::Closed) => Ok(()),
            other => other,
        }
    }

    /// Render `page` into the document, wait for any detached component
    /// it started, then finish.
    ///
    /// A producer fault fails the document, and so does a component that
    /// panics. A closed document means the client went away; rendering
    /// just stops.
    pub async fn render_page(&self, page: Content) {
        let target = self.target();
        let rendered = AssertUnwindSafe(async move { render_content(page, target).await })
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(Error::fault(panic_message(panic.as_ref()))));

        match rendered {
            Ok(()) => {
                self.target.join_detached().await;
                self.finish();
                debug!("document finished");
            }
            Err(Error::Closed) => debug!("client went away before the document finished"),
            Err(err) => {
                warn!(error = %err, "page render failed");
                self.fail(err);
            }
        }
    }

    /// The HTTP response streaming this document's chunks.
    ///
    /// Dropping the response body closes the document, which stops any
    /// producer still writing into it.
    pub fn into_response(self) -> Response<HtmlBody> {
        let stream = DocumentStream {
            inner: self.chunks().stream(),
        };
        let body = BodyExt::boxed(StreamBody::new(stream));

        let mut response = Response::new(body);
        let headers = response.headers_mut();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        response
    }
}

/// Open a document, return its response right away, and render `page`
/// into it on a spawned task.
pub fn stream_page(
    options: &DocumentOptions,
    capacity: Option<usize>,
    page: impl Into<Content>,
) -> ShellResult<Response<HtmlBody>> {
    let document = HtmlDocument::open(options, capacity)?;
    let response = document.clone().into_response();
    let page = page.into();
    tokio::spawn(async move { document.render_page(page).await });
    Ok(response)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause");
    format!("page render panicked: {detail}")
}

/// Document chunks as body frames.
struct DocumentStream {
    inner: ChunkStream<String>,
}

impl Stream for DocumentStream {
    type Item = std::result::Result<Frame<Bytes>, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner
            .poll_next_unpin(cx)
            .map(|item| item.map(|chunk| chunk.map(|c| Frame::data(Bytes::from(c)))))
    }
}

impl Drop for DocumentStream {
    fn drop(&mut self) {
        let chunks = self.inner.queue();
        if !chunks.is_closed() {
            debug!("response body dropped, closing document");
            chunks.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use interest_html::{jsx, Props, Tag};

    async fn drain(document: &HtmlDocument) -> Result<String> {
        let mut out = String::new();
        while let Some(chunk) = document.chunks().read().await? {
            out.push_str(&chunk);
        }
        Ok(out)
    }

    #[tokio::test]
    async fn open_writes_the_shell() {
        let document = HtmlDocument::open(&DocumentOptions::default(), None).unwrap();
        document.finish();
        assert_eq!(
            drain(&document).await.unwrap(),
            concat!(
                "<!DOCTYPE html>",
                r#"<html lang="en"><head><meta charset="utf-8">"#,
                r#"<meta name="viewport" content="width=device-width, initial-scale=1.0">"#,
                "</head><body></body></html>",
            )
        );
    }

    #[tokio::test]
    async fn open_includes_head_content_and_body_attributes() {
        let options = DocumentOptions {
            lang: "de".to_string(),
            head_content: Some("<title>T</title>".to_string()),
            body_attributes: Some(r#"class="x""#.to_string()),
        };
        let document = HtmlDocument::open(&options, None).unwrap();
        document.finish();
        let html = drain(&document).await.unwrap();
        assert!(html.starts_with(r#"<!DOCTYPE html><html lang="de">"#));
        assert!(html.contains(r#"initial-scale=1.0"><title>T</title></head><body class="x">"#));
        assert!(html.ends_with("</body></html>"));
    }

    #[tokio::test]
    async fn finish_is_idempotent_and_skipped_after_fail() {
        let document = HtmlDocument::open(&DocumentOptions::default(), None).unwrap();
        document.finish();
        document.finish();
        let html = drain(&document).await.unwrap();
        assert_eq!(html.matches("</html>").count(), 1);

        let failed = HtmlDocument::open(&DocumentOptions::default(), None).unwrap();
        failed.fail(Error::fault("boom"));
        failed.finish();
        assert_eq!(drain(&failed).await, Err(Error::fault("boom")));
    }

    #[tokio::test]
    async fn template_writes_raw_values_in_position() {
        let document = HtmlDocument::open(&DocumentOptions::default(), None).unwrap();
        document
            .write_template(&["<ul>", "", "</ul>"], vec![
                TemplateValue::future(async { Ok(Some("<li>a</li>".to_string())) }),
                TemplateValue::stream(stream::iter(vec![
                    Ok("<li>b</li>".to_string()),
                    Ok("<li>c</li>".to_string()),
                ])),
                None::<String>.into(),
            ])
            .await
            .unwrap();
        document.finish();

        let html = drain(&document).await.unwrap();
        assert!(html.ends_with("<body><ul><li>a</li><li>b</li><li>c</li></ul></body></html>"));
    }

    #[tokio::test]
    async fn template_stream_fault_is_returned() {
        let document = HtmlDocument::open(&DocumentOptions::default(), None).unwrap();
        let values = vec![TemplateValue::stream(stream::iter(vec![
            Ok("<li>a</li>".to_string()),
            Err(Error::fault("feed broke")),
        ]))];
        let result = document.write_template(&["<ol>", "</ol>"], values).await;
        assert_eq!(result, Err(Error::fault("feed broke")));
    }

    #[tokio::test]
    async fn template_into_closed_document_is_ignored() {
        let document = HtmlDocument::open(&DocumentOptions::default(), None).unwrap();
        document.finish();
        let result = document.write_template(&["<p>late</p>"], vec![]).await;
        assert!(result.is_ok());
        assert!(!drain(&document).await.unwrap().contains("late"));
    }

    #[tokio::test]
    async fn response_headers_and_body() {
        let document = HtmlDocument::open(&DocumentOptions::default(), None).unwrap();
        let response = document.clone().into_response();
        assert_eq!(response.headers()[CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(response.headers()[CACHE_CONTROL], "no-cache");

        document.target().write("<p>hi</p>").await.unwrap();
        document.finish();

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.ends_with("<p>hi</p></body></html>"));
    }

    #[tokio::test]
    async fn dropping_the_body_closes_the_document() {
        let document = HtmlDocument::open(&DocumentOptions::default(), None).unwrap();
        let response = document.clone().into_response();
        drop(response);

        assert!(document.is_closed());
        assert_eq!(document.target().write("x").await, Err(Error::Closed));
    }

    #[tokio::test]
    async fn render_page_finishes_after_content() {
        let document = HtmlDocument::open(&DocumentOptions::default(), None).unwrap();
        document.render_page(Content::raw("<main>ok</main>")).await;
        let html = drain(&document).await.unwrap();
        assert!(html.ends_with("<body><main>ok</main></body></html>"));
    }

    #[tokio::test]
    async fn render_page_panic_fails_the_document() {
        let document = HtmlDocument::open(&DocumentOptions::default(), None).unwrap();
        let broken = Tag::component(|_props: Props| -> Content { panic!("no such user") });
        let page = Content::from(vec![
            Content::raw("<p>before</p>"),
            Content::from(jsx(broken, Props::new())),
        ]);
        document.render_page(page).await;
        assert!(document.chunks().is_errored());
        assert_eq!(
            drain(&document).await,
            Err(Error::fault("page render panicked: no such user"))
        );
    }

    #[tokio::test]
    async fn render_page_fault_fails_the_document() {
        let document = HtmlDocument::open(&DocumentOptions::default(), None).unwrap();
        let page = Content::future(async { Err::<Content, _>(Error::fault("no data")) });
        document.render_page(page).await;
        assert!(document.chunks().is_errored());
        assert_eq!(drain(&document).await, Err(Error::fault("no data")));
    }
}
