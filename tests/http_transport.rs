#![cfg(feature = "http")]

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing_fluentbit_sink::{
    Attr, FluentBitHandler, HandlerContext, HandlerOptions, Level, LogRecord, SinkError,
};

struct CapturedRequest {
    head: String,
    body: Vec<u8>,
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|pos| pos + 4)
}

fn content_length(head: &str) -> usize {
    head.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

/// Accept a single request, capture it and answer with `status`.
fn serve_once(listener: TcpListener, status: u16) -> JoinHandle<CapturedRequest> {
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];

        let header_end = loop {
            let n = stream.read(&mut chunk).await.expect("read");
            assert!(n > 0, "connection closed before headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = find_header_end(&buf) {
                break end;
            }
        };
        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let length = content_length(&head);
        while buf.len() < header_end + length {
            let n = stream.read(&mut chunk).await.expect("read body");
            assert!(n > 0, "connection closed before body");
            buf.extend_from_slice(&chunk[..n]);
        }

        let response = format!(
            "HTTP/1.1 {} Stub\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
            status
        );
        stream.write_all(response.as_bytes()).await.expect("write response");

        CapturedRequest {
            head,
            body: buf[header_end..header_end + length].to_vec(),
        }
    })
}

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind(("127.0.0.1", 0)).await.expect("bind");
    let url = format!("http://{}/app.logs", listener.local_addr().expect("addr"));
    (listener, url)
}

#[tokio::test]
async fn posts_json_body_with_content_type() {
    let (listener, url) = bind().await;
    let server = serve_once(listener, 201);

    let handler = FluentBitHandler::new(HandlerOptions::new(url)).unwrap();
    let handler = handler.with_attrs(vec![Attr::new("service", "auth")]);
    handler
        .handle(
            HandlerContext::new(),
            LogRecord::new(Level::Error, "authentication failed").with_attr(Attr::new("user_id", 42)),
        )
        .await
        .unwrap();

    let request = server.await.unwrap();
    let head = request.head.to_ascii_lowercase();
    assert!(head.starts_with("post /app.logs http/1.1"));
    assert!(head.contains("content-type: application/json"));

    let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(body["msg"], "authentication failed");
    assert_eq!(body["level"], "ERROR");
    assert_eq!(body["service"], "auth");
    assert_eq!(body["user_id"], 42);
}

#[tokio::test]
async fn error_status_becomes_delivery_error() {
    let (listener, url) = bind().await;
    let server = serve_once(listener, 503);

    let handler = FluentBitHandler::new(HandlerOptions::new(url)).unwrap();
    let err = handler
        .handle(HandlerContext::new(), LogRecord::new(Level::Info, "m"))
        .await
        .unwrap_err();

    assert!(matches!(err, SinkError::Delivery { status: 503 }));
    server.await.unwrap();
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    let (listener, url) = bind().await;
    drop(listener);

    let handler = FluentBitHandler::new(HandlerOptions::new(url)).unwrap();
    let err = handler
        .handle(
            HandlerContext::new().with_timeout(std::time::Duration::from_secs(2)),
            LogRecord::new(Level::Info, "m"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, SinkError::Transport(_)));
}
