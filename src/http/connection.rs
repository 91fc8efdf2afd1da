use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::error::Result;
use crate::gateway::{self, Application, Environ};
use crate::http::parser::parse_request_line;
use crate::http::request::{RawRequest, RequestLine};
use crate::http::writer::{ResponseWriter, ServerHeaders};
use crate::server::identity::ServerIdentity;

/// Default value of the injected `Server` header.
pub const DEFAULT_SERVER_SOFTWARE: &str = "minigate/0.1";

/// Per-server settings every connection needs.
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    /// Value of the injected `Server` header.
    pub server_software: String,
    /// Echo request and response lines to the log, curl-verbose style.
    pub echo: bool,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            server_software: DEFAULT_SERVER_SOFTWARE.to_string(),
            echo: true,
        }
    }
}

/// One accepted client, served exactly once.
pub struct Connection<S> {
    stream: S,
    identity: Arc<ServerIdentity>,
    options: ConnectionOptions,
    state: ConnectionState,
}

enum ConnectionState {
    Accepted,
    Parsed(RawRequest, RequestLine),
    ContextBuilt(Environ),
    Declared(ResponseWriter, Summary),
    Closed,
}

/// What gets logged once a response went out.
struct Summary {
    method: String,
    path: String,
    status: String,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, identity: Arc<ServerIdentity>, options: ConnectionOptions) -> Self {
        Self {
            stream,
            identity,
            options,
            state: ConnectionState::Accepted,
        }
    }

    /// Runs the request through the pipeline and closes the connection.
    ///
    /// The stream is shut down and dropped on every path, whether the
    /// request succeeded or failed at any stage.
    pub async fn run<A>(mut self, app: &A) -> Result<()>
    where
        A: Application + ?Sized,
    {
        let result = self.process(app).await;
        self.close().await;
        result
    }

    async fn process<A>(&mut self, app: &A) -> Result<()>
    where
        A: Application + ?Sized,
    {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Accepted => {
                    let raw = RawRequest::read_from(&mut self.stream).await?;
                    self.echo_lines('<', raw.as_bytes());

                    let line = parse_request_line(&raw)?;
                    self.state = ConnectionState::Parsed(raw, line);
                }

                ConnectionState::Parsed(raw, line) => {
                    let environ = Environ::build(&line, &raw, &self.identity);
                    self.state = ConnectionState::ContextBuilt(environ);
                }

                ConnectionState::ContextBuilt(environ) => {
                    let (declaration, body) = gateway::invoke(app, &environ)?;
                    let body = gateway::collect_body(body)?;

                    let server_headers = ServerHeaders::now(&self.options.server_software);
                    let writer = ResponseWriter::new(&declaration, &server_headers, &body);

                    let summary = Summary {
                        method: environ.request_method().to_string(),
                        path: environ.path_info().to_string(),
                        status: declaration.status,
                    };
                    self.state = ConnectionState::Declared(writer, summary);
                }

                ConnectionState::Declared(mut writer, summary) => {
                    self.echo_lines('>', writer.as_bytes());
                    writer.write_to_stream(&mut self.stream).await?;

                    info!(
                        method = %summary.method,
                        path = %summary.path,
                        status = %summary.status,
                        bytes = writer.len(),
                        "Request handled"
                    );
                }

                ConnectionState::Closed => {
                    return Ok(());
                }
            }
        }
    }

    async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!("Shutdown after response failed: {}", e);
        }
        // Dropping the stream releases the socket.
    }

    fn echo_lines(&self, prefix: char, data: &[u8]) {
        if !self.options.echo {
            return;
        }
        for line in String::from_utf8_lossy(data).lines() {
            info!("{} {}", prefix, line);
        }
    }
}
