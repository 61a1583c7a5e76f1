//! HTTP server answering every request with a freshly streamed page.
//!
//! `HtmlServer` runs a hyper HTTP/1.1 server. Each request opens its own
//! [`HtmlDocument`](crate::HtmlDocument), so concurrent requests never
//! share a queue.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use interest_html::Content;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::config::ShellConfig;
use crate::document::{stream_page, DocumentOptions, HtmlBody};
use crate::error::{ShellError, ShellResult};

/// Builds the page content for one request.
pub type PageFn = Arc<dyn Fn() -> Content + Send + Sync>;

pub struct HtmlServer {
    bind_addr: SocketAddr,
    options: DocumentOptions,
    capacity: Option<usize>,
    page: PageFn,
}

impl HtmlServer {
    pub fn new(config: &ShellConfig, page: PageFn) -> Self {
        Self {
            bind_addr: config.server.bind,
            options: config.document_options(),
            capacity: config.queue.capacity,
            page,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Bind the configured address and serve until `shutdown` changes.
    pub async fn serve(self, shutdown: watch::Receiver<bool>) -> ShellResult<()> {
        let listener = TcpListener::bind(self.bind_addr)
            .await
            .map_err(|source| ShellError::Bind {
                addr: self.bind_addr,
                source,
            })?;
        self.serve_listener(listener, shutdown).await
    }

    /// Serve on an already bound listener. Spawns a task per connection.
    pub async fn serve_listener(
        self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> ShellResult<()> {
        let addr = listener.local_addr().unwrap_or(self.bind_addr);
        info!(%addr, "HTML server listening");

        let options = Arc::new(self.options);
        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    let (stream, peer_addr) = accept_result.map_err(ShellError::Accept)?;
                    let page = self.page.clone();
                    let options = options.clone();
                    let capacity = self.capacity;

                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);
                        let svc = service_fn(move |req: Request<Incoming>| {
                            let page = page.clone();
                            let options = options.clone();
                            async move {
                                debug!(%peer_addr, method = %req.method(), path = req.uri().path(), "streaming page");
                                Ok::<_, hyper::Error>(respond(&options, capacity, &page))
                            }
                        });

                        if let Err(e) = http1::Builder::new()
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(%peer_addr, error = %e, "connection error");
                        }
                    });
                }
                _ = shutdown.changed() => {
                    info!("HTML server shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

fn respond(options: &DocumentOptions, capacity: Option<usize>, page: &PageFn) -> Response<HtmlBody> {
    match stream_page(options, capacity, page()) {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "failed to open document");
            let body = Full::new(Bytes::from("Internal Server Error"))
                .map_err(|never| match never {})
                .boxed();
            let mut response = Response::new(body);
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interest_html::{jsx, Props};

    fn hello_page() -> PageFn {
        Arc::new(|| Content::from(jsx("h1", Props::new().child("hello"))))
    }

    #[test]
    fn server_takes_settings_from_config() {
        let config = ShellConfig::default().with_port(9123);
        let server = HtmlServer::new(&config, hello_page());
        assert_eq!(server.bind_addr().port(), 9123);
        assert!(server.capacity.is_none());
        assert_eq!(server.options.lang, "en");
    }

    #[tokio::test]
    async fn server_serves_and_shuts_down() {
        let config = ShellConfig::default().with_port(0);
        let server = HtmlServer::new(&config, hello_page());

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { server.serve(rx).await });

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        let result = handle.await.unwrap();
        assert!(result.is_ok());
    }
}
