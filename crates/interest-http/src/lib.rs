//! interest-http: delivers a rendered page as a live HTTP response.
//!
//! The document shell (doctype, `<head>`, `<body>` open tag) is written
//! the moment a request arrives; the page is rendered into the same queue
//! on a spawned task and streamed to the client as it resolves.
//!
//! # Architecture
//!
//! ```text
//! HTTP client
//!   │
//!   ▼
//! hyper server (HtmlServer)
//!   │
//!   ├── HtmlDocument::open        shell chunks, queue created
//!   ├── into_response             queue → body frames
//!   ├── spawned render_page       page → queue, then </body></html>
//!   │
//!   ▼
//! chunked HTML response
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod server;

pub use config::ShellConfig;
pub use document::{stream_page, DocumentOptions, HtmlBody, HtmlDocument, TemplateValue};
pub use error::{ShellError, ShellResult};
pub use server::{HtmlServer, PageFn};
