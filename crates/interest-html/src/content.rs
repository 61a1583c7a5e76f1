//! Renderable content.
//!
//! [`Content`] is the tagged union of everything that may appear as markup
//! content. Host values are converted into it when elements are built, so
//! the renderer dispatches on a closed set of shapes instead of inspecting
//! values at render time.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;

use futures_util::future::BoxFuture;
use futures_util::{Stream, StreamExt};
use interest_stream::{Result, Seq};

use crate::target::RenderTarget;

/// A deferred unit of renderable content: given a target, eventually
/// write zero or more chunks into it, in order.
///
/// Elements own no resources until rendered, and are consumed by
/// rendering.
pub struct Element(Box<dyn FnOnce(RenderTarget) -> BoxFuture<'static, Result<()>> + Send>);

impl Element {
    pub fn new<F, Fut>(render: F) -> Self
    where
        F: FnOnce(RenderTarget) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self(Box::new(move |target| Box::pin(render(target))))
    }

    /// Write this element into `target`.
    pub async fn render(self, target: RenderTarget) -> Result<()> {
        (self.0)(target).await
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Element(..)")
    }
}

/// How an async sequence is drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drain {
    /// Each item is rendered and awaited before the next is requested.
    Ordered,
    /// The sequence is drained in the background when it is rendered at
    /// the top level of a document; the caller continues immediately.
    /// Inside a tag body it is drained in order like [`Drain::Ordered`].
    Detached,
}

/// An async sequence of content plus its drain policy.
pub struct Sequence {
    pub(crate) items: Seq<Content>,
    pub(crate) drain: Drain,
}

impl Sequence {
    pub fn drain(&self) -> Drain {
        self.drain
    }
}

/// Everything that can appear as markup content.
pub enum Content {
    /// Null, undefined or a boolean: renders nothing.
    Empty,
    /// Text, escaped on write.
    Text(String),
    /// Pre-serialized markup, written as is.
    Raw(String),
    /// Integers keep their exact decimal form.
    Integer(i128),
    Number(f64),
    Element(Element),
    /// Content available later; resolved, then rendered.
    Future(BoxFuture<'static, Result<Content>>),
    /// Rendered item by item, in order.
    List(Vec<Content>),
    Sequence(Sequence),
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text(text.into())
    }

    pub fn raw(html: impl Into<String>) -> Self {
        Content::Raw(html.into())
    }

    /// Any value rendered through its escaped string form.
    pub fn display(value: impl fmt::Display) -> Self {
        Content::Text(value.to_string())
    }

    /// A write callback, invoked with the target when rendered.
    pub fn thunk<F, Fut>(render: F) -> Self
    where
        F: FnOnce(RenderTarget) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Content::Element(Element::new(render))
    }

    pub fn future<F, C>(future: F) -> Self
    where
        F: Future<Output = Result<C>> + Send + 'static,
        C: Into<Content>,
    {
        Content::Future(Box::pin(async move { future.await.map(Into::<Content>::into) }))
    }

    /// An ordered async sequence.
    pub fn sequence<S, C>(items: S) -> Self
    where
        S: Stream<Item = Result<C>> + Send + 'static,
        C: Into<Content> + Send + 'static,
    {
        Content::Sequence(Sequence {
            items: Box::pin(items.map(|item| item.map(Into::<Content>::into))),
            drain: Drain::Ordered,
        })
    }

    /// An async sequence drained in the background at the top level.
    pub fn detached<S, C>(items: S) -> Self
    where
        S: Stream<Item = Result<C>> + Send + 'static,
        C: Into<Content> + Send + 'static,
    {
        Content::sequence(items).into_detached()
    }

    /// Mark a top-level sequence as detached; other shapes pass through.
    pub fn into_detached(self) -> Self {
        match self {
            Content::Sequence(seq) => Content::Sequence(Sequence {
                items: seq.items,
                drain: Drain::Detached,
            }),
            other => other,
        }
    }

    /// `true` for content that renders nothing without awaiting.
    pub fn is_empty(&self) -> bool {
        match self {
            Content::Empty => true,
            Content::Text(s) | Content::Raw(s) => s.is_empty(),
            Content::List(items) => items.iter().all(Content::is_empty),
            _ => false,
        }
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Content::Empty => f.write_str("Empty"),
            Content::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Content::Raw(s) => f.debug_tuple("Raw").field(s).finish(),
            Content::Integer(n) => f.debug_tuple("Integer").field(n).finish(),
            Content::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Content::Element(_) => f.write_str("Element(..)"),
            Content::Future(_) => f.write_str("Future(..)"),
            Content::List(items) => f.debug_tuple("List").field(items).finish(),
            Content::Sequence(seq) => write!(f, "Sequence({:?})", seq.drain),
        }
    }
}

impl From<Element> for Content {
    fn from(element: Element) -> Self {
        Content::Element(element)
    }
}

impl From<Sequence> for Content {
    fn from(seq: Sequence) -> Self {
        Content::Sequence(seq)
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Content::Text(s.to_string())
    }
}

impl From<&String> for Content {
    fn from(s: &String) -> Self {
        Content::Text(s.clone())
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Content::Text(s)
    }
}

impl From<Cow<'_, str>> for Content {
    fn from(s: Cow<'_, str>) -> Self {
        Content::Text(s.into_owned())
    }
}

impl From<bool> for Content {
    fn from(_: bool) -> Self {
        Content::Empty
    }
}

impl From<()> for Content {
    fn from(_: ()) -> Self {
        Content::Empty
    }
}

macro_rules! integer_content {
    ($($t:ty),*) => {
        $(impl From<$t> for Content {
            fn from(n: $t) -> Self {
                Content::Integer(i128::from(n))
            }
        })*
    };
}

integer_content!(i8, i16, i32, i64, i128, u8, u16, u32, u64);

impl From<usize> for Content {
    fn from(n: usize) -> Self {
        Content::Integer(n as i128)
    }
}

impl From<isize> for Content {
    fn from(n: isize) -> Self {
        Content::Integer(n as i128)
    }
}

impl From<f64> for Content {
    fn from(n: f64) -> Self {
        Content::Number(n)
    }
}

impl From<f32> for Content {
    fn from(n: f32) -> Self {
        Content::Number(f64::from(n))
    }
}

impl<T: Into<Content>> From<Option<T>> for Content {
    fn from(value: Option<T>) -> Self {
        value.map_or(Content::Empty, Into::into)
    }
}

impl<T: Into<Content>> From<Vec<T>> for Content {
    fn from(items: Vec<T>) -> Self {
        Content::List(items.into_iter().map(Into::into).collect())
    }
}
