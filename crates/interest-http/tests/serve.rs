//! Requests against a running server, read off the raw socket so the
//! chunked framing is visible.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream;
use interest_html::{close, jsx, open, Content, Error, Props, Tag};
use interest_http::{HtmlServer, PageFn, ShellConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

fn fruit_page() -> PageFn {
    Arc::new(|| {
        let fruits = Tag::component(|_props: Props| {
            let items = std::iter::once(Content::from(open("ol")))
                .chain(
                    ["Apple", "Banana"].map(|f| Content::from(jsx("li", Props::new().child(f)))),
                )
                .chain(std::iter::once(Content::from(close("ol"))));
            Content::sequence(stream::unfold(items, |mut items| async move {
                let item = items.next()?;
                tokio::time::sleep(Duration::from_millis(10)).await;
                Some((Ok(item), items))
            }))
        });
        Content::from(jsx(
            Tag::Fragment,
            Props::new()
                .child(jsx("h1", Props::new().child("Fruits")))
                .child(jsx(fruits, Props::new())),
        ))
    })
}

async fn start(config: ShellConfig, page: PageFn) -> (std::net::SocketAddr, watch::Sender<bool>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = watch::channel(false);
    let server = HtmlServer::new(&config, page);
    tokio::spawn(async move { server.serve_listener(listener, rx).await });
    (addr, tx)
}

async fn get(addr: std::net::SocketAddr) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    // An aborted response may end in a reset rather than EOF.
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => raw.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8_lossy(&raw).into_owned()
}

#[tokio::test]
async fn page_is_streamed_as_chunked_html() {
    let (addr, shutdown) = start(ShellConfig::default(), fruit_page()).await;

    let response = get(addr).await;
    let lower = response.to_ascii_lowercase();
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(lower.contains("content-type: text/html; charset=utf-8"));
    assert!(lower.contains("cache-control: no-cache"));
    assert!(lower.contains("transfer-encoding: chunked"));

    let order = [
        "<!DOCTYPE html>",
        "</head><body",
        "<h1>",
        "Fruits",
        "<ol>",
        "Apple",
        "Banana",
        "</ol>",
        "</body></html>",
    ];
    let mut from = 0;
    for needle in order {
        let at = response[from..]
            .find(needle)
            .unwrap_or_else(|| panic!("{needle} missing or out of order in {response}"));
        from += at + needle.len();
    }
    assert!(response.ends_with("0\r\n\r\n"));

    shutdown.send(true).unwrap();
}

#[tokio::test]
async fn document_options_and_bounded_queue_apply() {
    let mut config = ShellConfig::default();
    config.document.lang = "nl".to_string();
    config.document.head_content = Some("<title>Fruit</title>".to_string());
    config.queue.capacity = Some(2);
    let (addr, shutdown) = start(config, fruit_page()).await;

    let response = get(addr).await;
    assert!(response.contains(r#"<html lang="nl">"#));
    assert!(response.contains("<title>Fruit</title>"));
    assert!(response.contains("</body></html>"));

    shutdown.send(true).unwrap();
}

#[tokio::test]
async fn concurrent_requests_get_separate_documents() {
    let (addr, shutdown) = start(ShellConfig::default(), fruit_page()).await;

    let (a, b) = tokio::join!(get(addr), get(addr));
    for response in [a, b] {
        assert_eq!(response.matches("<!DOCTYPE html>").count(), 1);
        assert_eq!(response.matches("<li>").count(), 2);
    }

    shutdown.send(true).unwrap();
}

#[tokio::test]
async fn faulting_page_truncates_the_response() {
    let page: PageFn = Arc::new(|| {
        let failing = Content::future(async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Err::<Content, _>(Error::fault("backend unavailable"))
        });
        Content::from(jsx("main", Props::new().child("partial").child(failing)))
    });
    let (addr, shutdown) = start(ShellConfig::default(), page).await;

    let response = get(addr).await;
    assert!(response.contains("partial"));
    assert!(!response.contains("</html>"));

    shutdown.send(true).unwrap();
}

#[tokio::test]
async fn panicking_component_still_ends_the_response() {
    let page: PageFn = Arc::new(|| {
        let broken = Tag::component(|_props: Props| -> Content { panic!("template missing") });
        Content::from(jsx(
            Tag::Fragment,
            Props::new().child("before").child(jsx(broken, Props::new())),
        ))
    });
    let (addr, shutdown) = start(ShellConfig::default(), page).await;

    let response = tokio::time::timeout(Duration::from_secs(2), get(addr))
        .await
        .expect("response should end after the panic");
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(!response.contains("</html>"));

    shutdown.send(true).unwrap();
}
