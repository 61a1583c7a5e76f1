//! The tag builder: a per-name handle that writes a matched open/close tag
//! pair, or a single self-closing tag for void elements.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use interest_stream::Result;
use tracing::trace;

use crate::content::Content;
use crate::escape::{serialize_attributes, Attrs};
use crate::render::render_content;
use crate::target::RenderTarget;

/// HTML elements that never take children or a closing tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoidTag {
    Area,
    Base,
    Br,
    Col,
    Embed,
    Hr,
    Img,
    Input,
    Link,
    Meta,
    Param,
    Source,
    Track,
    Wbr,
}

impl VoidTag {
    pub const ALL: [VoidTag; 14] = [
        VoidTag::Area,
        VoidTag::Base,
        VoidTag::Br,
        VoidTag::Col,
        VoidTag::Embed,
        VoidTag::Hr,
        VoidTag::Img,
        VoidTag::Input,
        VoidTag::Link,
        VoidTag::Meta,
        VoidTag::Param,
        VoidTag::Source,
        VoidTag::Track,
        VoidTag::Wbr,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VoidTag::Area => "area",
            VoidTag::Base => "base",
            VoidTag::Br => "br",
            VoidTag::Col => "col",
            VoidTag::Embed => "embed",
            VoidTag::Hr => "hr",
            VoidTag::Img => "img",
            VoidTag::Input => "input",
            VoidTag::Link => "link",
            VoidTag::Meta => "meta",
            VoidTag::Param => "param",
            VoidTag::Source => "source",
            VoidTag::Track => "track",
            VoidTag::Wbr => "wbr",
        }
    }

    /// Classify a tag name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<VoidTag> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(name))
    }
}

pub fn is_void(name: &str) -> bool {
    VoidTag::from_name(name).is_some()
}

/// Tag namespace bound to one render target.
///
/// Any name yields a [`TagHandle`]; handles are memoized per name.
pub struct Html {
    target: RenderTarget,
    cache: Mutex<HashMap<String, TagHandle>>,
}

impl Html {
    pub fn new(target: RenderTarget) -> Self {
        Self {
            target,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    /// The handle for `name`, created on first use.
    pub fn tag(&self, name: &str) -> TagHandle {
        let mut cache = self.cache.lock().expect("tag cache lock");
        if let Some(handle) = cache.get(name) {
            return handle.clone();
        }
        let handle = TagHandle(Arc::new(TagInner {
            name: name.to_string(),
            void: VoidTag::from_name(name),
            target: self.target.clone(),
        }));
        cache.insert(name.to_string(), handle.clone());
        handle
    }
}

struct TagInner {
    name: String,
    void: Option<VoidTag>,
    target: RenderTarget,
}

/// Writes one tag name into a target.
///
/// All invocation shapes converge on [`TagHandle::write`].
#[derive(Clone)]
pub struct TagHandle(Arc<TagInner>);

impl TagHandle {
    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn is_void(&self) -> bool {
        self.0.void.is_some()
    }

    /// `true` when both handles came from the same cache entry.
    pub fn same(a: &TagHandle, b: &TagHandle) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Attributes followed by children.
    pub async fn with(&self, attrs: Attrs, children: Vec<Content>) -> Result<()> {
        self.write(Some(&attrs), children).await
    }

    /// Children only.
    pub async fn children(&self, children: Vec<Content>) -> Result<()> {
        self.write(None, children).await
    }

    /// Literal text interleaved with values: `segments[0]`, `values[0]`,
    /// `segments[1]`, ... Literal segments are escaped like any text.
    pub async fn template(&self, segments: &[&str], values: Vec<Content>) -> Result<()> {
        let mut values = values.into_iter();
        let mut children = Vec::with_capacity(segments.len() * 2);
        for segment in segments {
            if !segment.is_empty() {
                children.push(Content::text(*segment));
            }
            if let Some(value) = values.next() {
                children.push(value);
            }
        }
        children.extend(values);
        self.write(None, children).await
    }

    /// A single callback that performs the body's writes itself.
    pub async fn thunk<F, Fut>(&self, body: F) -> Result<()>
    where
        F: FnOnce(RenderTarget) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.write(None, vec![Content::thunk(body)]).await
    }

    /// Write the open tag, every child in order, then the close tag.
    ///
    /// Void elements get a single self-closing tag; their children are
    /// not rendered.
    pub async fn write(&self, attrs: Option<&Attrs>, children: Vec<Content>) -> Result<()> {
        let inner = &self.0;
        let attributes = attrs.map(serialize_attributes).unwrap_or_default();

        if inner.void.is_some() {
            if !children.is_empty() {
                trace!(tag = %inner.name, "dropping children of void element");
            }
            return inner
                .target
                .write(format!("<{}{}/>", inner.name, attributes))
                .await;
        }

        inner
            .target
            .write(format!("<{}{}>", inner.name, attributes))
            .await?;
        let body = inner.target.nested();
        for child in children {
            render_content(child, body.clone()).await?;
        }
        inner.target.write(format!("</{}>", inner.name)).await
    }
}
