//! interest-html: serializes a tree of possibly-async markup content into
//! a [`ChunkQueue`] as it resolves.
//!
//! A render writes chunks in document order. Async children of a tag are
//! awaited one by one so the tag's body is never interleaved with its
//! siblings. A component that returns an async sequence at the top level
//! is drained in the background instead; this lets a page flush its shell
//! before a slow list is complete.
//!
//! ```
//! use interest_html::{jsx, render, ChunkQueue, Props, RenderTarget};
//!
//! # block_on(async {
//! let queue = ChunkQueue::unbounded();
//! let el = jsx("p", Props::new().attr("class", "note").child("1 < 2"));
//! render(el, RenderTarget::new(queue.clone())).await.unwrap();
//! queue.close();
//!
//! let mut html = String::new();
//! while let Some(chunk) = queue.read().await.unwrap() {
//!     html.push_str(&chunk);
//! }
//! assert_eq!(html, r#"<p class="note">1 &lt; 2</p>"#);
//! # });
//! # fn block_on(f: impl std::future::Future<Output = ()>) {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

mod content;
mod escape;
mod jsx;
mod render;
mod tag;
mod target;

pub use content::{Content, Drain, Element, Sequence};
pub use escape::{escape, escape_owned, format_number, serialize_attributes, AttrValue, Attrs};
pub use jsx::{close, jsx, jsxs, open, raw, render, Component, Props, Tag};
pub use render::render_content;
pub use tag::{is_void, Html, TagHandle, VoidTag};
pub use target::RenderTarget;

pub use interest_stream::{ChunkQueue, Error, Result};
