use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Largest number of bytes taken from a connection.
///
/// A request is read with a single receive call. Request lines split over
/// several packets and bodies that do not fit are truncated; this server
/// does not support them.
pub const MAX_REQUEST_SIZE: usize = 1024;

/// The bytes received from a client, as read off the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRequest {
    bytes: Bytes,
}

impl RawRequest {
    /// Reads at most [`MAX_REQUEST_SIZE`] bytes with one read call.
    ///
    /// Returns an empty request if the peer closed without sending data.
    pub async fn read_from<S>(stream: &mut S) -> std::io::Result<Self>
    where
        S: AsyncRead + Unpin,
    {
        let mut buf = [0u8; MAX_REQUEST_SIZE];
        let n = stream.read(&mut buf).await?;

        Ok(Self {
            bytes: Bytes::copy_from_slice(&buf[..n]),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Cheap handle on the underlying buffer.
    pub fn bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<&[u8]> for RawRequest {
    fn from(buf: &[u8]) -> Self {
        Self {
            bytes: Bytes::copy_from_slice(buf),
        }
    }
}

impl From<Vec<u8>> for RawRequest {
    fn from(buf: Vec<u8>) -> Self {
        Self { bytes: buf.into() }
    }
}

/// The three tokens of an HTTP request line, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    /// e.g. "GET"
    pub method: String,
    /// e.g. "/hello?name=x"
    pub path: String,
    /// e.g. "HTTP/1.1"
    pub version: String,
}
