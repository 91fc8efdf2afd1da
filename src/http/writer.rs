use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::Result;
use crate::http::response::ResponseDeclaration;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Headers the server appends after the application's own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHeaders {
    pub date: String,
    pub server: String,
}

impl ServerHeaders {
    /// `Date` set to the current time in IMF-fixdate form.
    pub fn now(server: impl Into<String>) -> Self {
        Self {
            date: chrono::Utc::now()
                .format("%a, %d %b %Y %H:%M:%S GMT")
                .to_string(),
            server: server.into(),
        }
    }
}

/// Serializes status line, headers, blank line and body, in that order.
pub fn serialize_response(
    declaration: &ResponseDeclaration,
    server_headers: &ServerHeaders,
    body: &[Bytes],
) -> BytesMut {
    let body_len: usize = body.iter().map(Bytes::len).sum();
    let mut buf = BytesMut::with_capacity(256 + body_len);

    // Status line
    buf.put_slice(HTTP_VERSION.as_bytes());
    buf.put_u8(b' ');
    buf.put_slice(declaration.status.as_bytes());
    buf.put_slice(b"\r\n");

    // Declared headers, then ours
    let injected = [
        ("Date", server_headers.date.as_str()),
        ("Server", server_headers.server.as_str()),
    ];
    let headers = declaration
        .headers
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .chain(injected);
    for (k, v) in headers {
        buf.put_slice(k.as_bytes());
        buf.put_slice(b": ");
        buf.put_slice(v.as_bytes());
        buf.put_slice(b"\r\n");
    }

    // Header/body separator
    buf.put_slice(b"\r\n");

    for fragment in body {
        buf.put_slice(fragment);
    }

    buf
}

pub struct ResponseWriter {
    buffer: Bytes,
    written: usize,
}

impl ResponseWriter {
    pub fn new(
        declaration: &ResponseDeclaration,
        server_headers: &ServerHeaders,
        body: &[Bytes],
    ) -> Self {
        Self {
            buffer: serialize_response(declaration, server_headers, body).freeze(),
            written: 0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Writes the whole response, looping over partial writes.
    pub async fn write_to_stream<S>(&mut self, stream: &mut S) -> Result<()>
    where
        S: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..]).await?;

            if n == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "connection closed while writing",
                )
                .into());
            }

            self.written += n;
        }

        stream.flush().await?;
        Ok(())
    }
}
