//! Element construction: the calls a JSX-style front end lowers to.
//!
//! [`jsx`] turns a tag identity and its props into a deferred [`Element`].
//! Nothing is written until the element is rendered into a target.

use std::fmt;
use std::sync::Arc;

use interest_stream::Result;

use crate::content::{Content, Element};
use crate::escape::{AttrValue, Attrs};
use crate::render::render_content;
use crate::tag::{is_void, Html};
use crate::target::RenderTarget;

/// A function from props to content.
pub type Component = Arc<dyn Fn(Props) -> Content + Send + Sync>;

/// What an element wraps its children in.
#[derive(Clone)]
pub enum Tag {
    /// No wrapping tag.
    Fragment,
    Component(Component),
    Name(String),
}

impl Tag {
    pub fn component<F, C>(f: F) -> Self
    where
        F: Fn(Props) -> C + Send + Sync + 'static,
        C: Into<Content>,
    {
        Tag::Component(Arc::new(move |props| f(props).into()))
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Fragment => f.write_str("Fragment"),
            Tag::Component(_) => f.write_str("Component(..)"),
            Tag::Name(name) => f.debug_tuple("Name").field(name).finish(),
        }
    }
}

impl From<&str> for Tag {
    fn from(name: &str) -> Self {
        Tag::Name(name.to_string())
    }
}

impl From<String> for Tag {
    fn from(name: String) -> Self {
        Tag::Name(name)
    }
}

/// Attributes plus children.
#[derive(Debug, Default)]
pub struct Props {
    pub attrs: Attrs,
    pub children: Vec<Content>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(name, value);
        self
    }

    pub fn child(mut self, child: impl Into<Content>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I, C>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Content>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }
}

impl From<Attrs> for Props {
    fn from(attrs: Attrs) -> Self {
        Props {
            attrs,
            children: Vec::new(),
        }
    }
}

/// Build a deferred element for `tag`.
///
/// - [`Tag::Fragment`] renders the children in order, unwrapped.
/// - [`Tag::Component`] calls the component and renders what it returns.
///   A sequence returned here is detached when rendered at the top level
///   of a document, so the caller is not held up by it.
/// - [`Tag::Name`] writes the tag. Children are rendered inside the tag
///   body once the open tag has been written.
pub fn jsx(tag: impl Into<Tag>, props: Props) -> Element {
    let tag = tag.into();
    Element::new(move |target: RenderTarget| async move {
        let Props { attrs, children } = props;
        match tag {
            Tag::Fragment => {
                for child in children {
                    render_content(child, target.clone()).await?;
                }
                Ok(())
            }
            Tag::Component(component) => {
                let output = component(Props { attrs, children }).into_detached();
                render_content(output, target).await
            }
            Tag::Name(name) => {
                let handle = Html::new(target).tag(&name);
                if children.is_empty() || is_void(&name) {
                    handle.write(Some(&attrs), children).await
                } else {
                    let body = Content::thunk(move |body: RenderTarget| async move {
                        for child in children {
                            render_content(child, body.clone()).await?;
                        }
                        Ok(())
                    });
                    handle.with(attrs, vec![body]).await
                }
            }
        }
    })
}

/// Same as [`jsx`]; lowered calls with static child lists use this name.
pub fn jsxs(tag: impl Into<Tag>, props: Props) -> Element {
    jsx(tag, props)
}

/// An element that writes `html` unescaped. Writing into a closed
/// document is a no-op.
pub fn raw(html: impl Into<String>) -> Element {
    let html = html.into();
    Element::new(move |target: RenderTarget| async move {
        if target.chunks().is_closed() {
            return Ok(());
        }
        target.write(html).await
    })
}

/// A bare opening tag, for wrapping content emitted separately.
pub fn open(tag: &str) -> Element {
    raw(format!("<{tag}>"))
}

/// The closing counterpart of [`open`].
pub fn close(tag: &str) -> Element {
    raw(format!("</{tag}>"))
}

/// Render a top-level tree into `target`.
pub async fn render(content: impl Into<Content>, target: RenderTarget) -> Result<()> {
    render_content(content.into(), target).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use interest_stream::ChunkQueue;

    async fn render_string(content: impl Into<Content>) -> String {
        let queue = ChunkQueue::unbounded();
        let target = RenderTarget::new(queue.clone());
        render(content, target.clone()).await.unwrap();
        target.join_detached().await;
        queue.close();
        let mut out = String::new();
        while let Some(chunk) = queue.read().await.unwrap() {
            out.push_str(&chunk);
        }
        out
    }

    #[tokio::test]
    async fn fragment_renders_children_unwrapped() {
        let props = Props::new().children(vec![
            Content::from(1),
            Content::Empty,
            "x".into(),
            false.into(),
        ]);
        assert_eq!(render_string(jsx(Tag::Fragment, props)).await, "1x");
    }

    #[tokio::test]
    async fn named_tag_keeps_attributes_when_childless() {
        let img = jsx("img", Props::new().attr("src", "x.png").attr("alt", None::<&str>));
        assert_eq!(render_string(img).await, r#"<img src="x.png"/>"#);

        let div = jsx("div", Props::new().attr("id", "empty"));
        assert_eq!(render_string(div).await, r#"<div id="empty"></div>"#);
    }

    #[tokio::test]
    async fn named_tag_renders_children_in_body() {
        let p = jsx("p", Props::new().attr("class", "a b").child("hi<br>"));
        assert_eq!(render_string(p).await, r#"<p class="a b">hi&lt;br&gt;</p>"#);
    }

    #[tokio::test]
    async fn nested_elements() {
        let list = jsxs(
            "ul",
            Props::new().children(["a", "b"].map(|s| jsx("li", Props::new().child(s)))),
        );
        assert_eq!(render_string(list).await, "<ul><li>a</li><li>b</li></ul>");
    }

    #[tokio::test]
    async fn component_receives_props() {
        let greet = Tag::component(|props: Props| {
            let name = props.attrs.get("name").map(ToString::to_string);
            jsx("b", Props::new().child(name))
        });
        let el = jsx(greet, Props::new().attr("name", "Ada"));
        assert_eq!(render_string(el).await, "<b>Ada</b>");
    }

    #[tokio::test]
    async fn raw_open_and_close_are_unescaped() {
        let el = jsx(
            Tag::Fragment,
            Props::new()
                .child(open("ol"))
                .child(raw("<li>&</li>"))
                .child(close("ol")),
        );
        assert_eq!(render_string(el).await, "<ol><li>&</li></ol>");
    }

    #[tokio::test]
    async fn raw_into_closed_queue_is_ignored() {
        let queue = ChunkQueue::unbounded();
        queue.close();
        let result = render(raw("<p>"), RenderTarget::new(queue)).await;
        assert!(result.is_ok());
    }

    #[test]
    fn tag_debug() {
        assert_eq!(format!("{:?}", Tag::from("p")), r#"Name("p")"#);
        assert_eq!(format!("{:?}", Tag::Fragment), "Fragment");
    }
}
