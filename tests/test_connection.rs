//! Pipeline tests over an in-memory stream.

use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use minigate::error::ServerError;
use minigate::gateway::{Body, Environ, body};
use minigate::http::connection::{Connection, ConnectionOptions};
use minigate::http::response::StartResponse;
use minigate::server::ServerIdentity;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

#[derive(Default)]
struct StreamLog {
    written: Mutex<Vec<u8>>,
    shutdowns: AtomicUsize,
    drops: AtomicUsize,
}

/// Serves `input` on read, records writes, and counts closes.
struct MockStream {
    input: Vec<u8>,
    pos: usize,
    fail_writes: bool,
    log: Arc<StreamLog>,
}

impl MockStream {
    fn new(input: &[u8]) -> (Self, Arc<StreamLog>) {
        let log = Arc::new(StreamLog::default());
        let stream = Self {
            input: input.to_vec(),
            pos: 0,
            fail_writes: false,
            log: Arc::clone(&log),
        };
        (stream, log)
    }

    fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let remaining = &self.input[self.pos..];
        let n = remaining.len().min(buf.remaining());
        buf.put_slice(&remaining[..n]);
        self.pos += n;
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if self.fail_writes {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "peer reset",
            )));
        }
        // Accept at most 7 bytes per call to exercise partial writes.
        let n = buf.len().min(7);
        self.log.written.lock().unwrap().extend_from_slice(&buf[..n]);
        Poll::Ready(Ok(n))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.log.shutdowns.fetch_add(1, Ordering::SeqCst);
        Poll::Ready(Ok(()))
    }
}

impl Drop for MockStream {
    fn drop(&mut self) {
        self.log.drops.fetch_add(1, Ordering::SeqCst);
    }
}

fn identity() -> Arc<ServerIdentity> {
    Arc::new(ServerIdentity::new(
        "127.0.0.1:8888".parse().unwrap(),
        "localhost",
    ))
}

fn options() -> ConnectionOptions {
    ConnectionOptions {
        server_software: "minigate/test".to_string(),
        echo: true,
    }
}

fn hello(_: &Environ, start_response: &mut StartResponse) -> anyhow::Result<Body> {
    start_response.declare("200 OK", [("Content-Type", "text/plain")])?;
    Ok(body(["Hello", "World"]))
}

fn assert_closed_once(log: &StreamLog) {
    assert_eq!(log.shutdowns.load(Ordering::SeqCst), 1);
    assert_eq!(log.drops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_successful_request_is_written_and_closed() {
    let (stream, log) = MockStream::new(b"GET /hello HTTP/1.1\r\nHost: x\r\n\r\n");

    Connection::new(stream, identity(), options())
        .run(&hello)
        .await
        .unwrap();

    let written = String::from_utf8(log.written.lock().unwrap().clone()).unwrap();
    assert!(written.starts_with("HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nDate: "));
    assert!(written.contains("\r\nServer: minigate/test\r\n\r\n"));
    assert!(written.ends_with("\r\n\r\nHelloWorld"));
    assert_closed_once(&log);
}

#[tokio::test]
async fn test_empty_request_is_malformed_and_closed() {
    let (stream, log) = MockStream::new(b"");

    let result = Connection::new(stream, identity(), options()).run(&hello).await;

    assert!(matches!(result, Err(ServerError::MalformedRequest(_))));
    assert!(log.written.lock().unwrap().is_empty());
    assert_closed_once(&log);
}

#[tokio::test]
async fn test_bad_request_line_is_malformed_and_closed() {
    let (stream, log) = MockStream::new(b"GET /only-two\r\n\r\n");

    let result = Connection::new(stream, identity(), options()).run(&hello).await;

    assert!(matches!(result, Err(ServerError::MalformedRequest(_))));
    assert_closed_once(&log);
}

#[tokio::test]
async fn test_application_error_closes_without_response() {
    let (stream, log) = MockStream::new(b"GET / HTTP/1.1\r\n\r\n");
    let app = |_: &Environ, _: &mut StartResponse| -> anyhow::Result<Body> {
        anyhow::bail!("exploded")
    };

    let result = Connection::new(stream, identity(), options()).run(&app).await;

    assert!(matches!(result, Err(ServerError::Application(_))));
    assert!(log.written.lock().unwrap().is_empty());
    assert_closed_once(&log);
}

#[tokio::test]
async fn test_missing_declaration_closes_without_response() {
    let (stream, log) = MockStream::new(b"GET / HTTP/1.1\r\n\r\n");
    let app = |_: &Environ, _: &mut StartResponse| -> anyhow::Result<Body> { Ok(body(["x"])) };

    let result = Connection::new(stream, identity(), options()).run(&app).await;

    assert!(matches!(result, Err(ServerError::MissingResponseDeclaration)));
    assert!(log.written.lock().unwrap().is_empty());
    assert_closed_once(&log);
}

#[tokio::test]
async fn test_failing_body_closes_without_response() {
    let (stream, log) = MockStream::new(b"GET / HTTP/1.1\r\n\r\n");
    let app = |_: &Environ, start_response: &mut StartResponse| -> anyhow::Result<Body> {
        start_response.declare("200 OK", Vec::<(String, String)>::new())?;
        let fragments = vec![Ok(bytes::Bytes::from("a")), Err(anyhow::anyhow!("gone"))];
        Ok(Box::new(fragments.into_iter()))
    };

    let result = Connection::new(stream, identity(), options()).run(&app).await;

    assert!(matches!(result, Err(ServerError::Application(_))));
    assert!(log.written.lock().unwrap().is_empty());
    assert_closed_once(&log);
}

#[tokio::test]
async fn test_write_failure_still_closes_once() {
    let (stream, log) = MockStream::new(b"GET / HTTP/1.1\r\n\r\n");
    let stream = stream.failing_writes();

    let result = Connection::new(stream, identity(), options()).run(&hello).await;

    assert!(matches!(result, Err(ServerError::Io(_))));
    assert_closed_once(&log);
}

#[tokio::test]
async fn test_environ_seen_by_application() {
    let (stream, log) = MockStream::new(b"PUT /items/9?force=1 HTTP/1.0\r\n\r\n");
    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    let app = move |env: &Environ, start_response: &mut StartResponse| -> anyhow::Result<Body> {
        *sink.lock().unwrap() = Some(env.clone());
        start_response.declare("204 No Content", Vec::<(String, String)>::new())?;
        Ok(body(Vec::<bytes::Bytes>::new()))
    };

    Connection::new(stream, identity(), options())
        .run(&app)
        .await
        .unwrap();

    let env = seen.lock().unwrap().take().unwrap();
    assert_eq!(env.request_method(), "PUT");
    assert_eq!(env.path_info(), "/items/9?force=1");
    assert_eq!(env.query_string(), "force=1");
    assert_eq!(env.text("SERVER_PROTOCOL"), Some("HTTP/1.0"));
    assert_eq!(env.server_name(), "localhost");
    assert_eq!(env.server_port(), "8888");
    assert_closed_once(&log);
}

#[tokio::test]
async fn test_echo_disabled_does_not_change_response() {
    let (stream, log) = MockStream::new(b"GET / HTTP/1.1\r\n\r\n");
    let quiet = ConnectionOptions {
        echo: false,
        ..options()
    };

    Connection::new(stream, identity(), quiet)
        .run(&hello)
        .await
        .unwrap();

    let written = log.written.lock().unwrap().clone();
    assert!(written.ends_with(b"HelloWorld"));
    assert_closed_once(&log);
}
