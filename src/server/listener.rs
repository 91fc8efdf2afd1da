use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tracing::{error, info};

use crate::error::{Result, ServerError};
use crate::gateway::Application;
use crate::http::connection::{Connection, ConnectionOptions};
use crate::server::identity::ServerIdentity;

/// Pending connections queued by the OS while a request is being served.
pub const BACKLOG: u32 = 1;

/// Pause before accepting again after `accept` failed.
pub const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Listening endpoint. Hands out one connection at a time.
pub struct Listener {
    inner: TcpListener,
    identity: Arc<ServerIdentity>,
}

impl Listener {
    /// Binds `addr` with address reuse enabled and a backlog of one.
    pub async fn bind(addr: &str) -> Result<Self> {
        let bind_err = |source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        };

        let sock_addr = tokio::net::lookup_host(addr)
            .await
            .map_err(bind_err)?
            .next()
            .ok_or_else(|| {
                bind_err(std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    "address did not resolve",
                ))
            })?;

        let socket = match sock_addr {
            SocketAddr::V4(_) => TcpSocket::new_v4(),
            SocketAddr::V6(_) => TcpSocket::new_v6(),
        }
        .map_err(bind_err)?;

        socket.set_reuseaddr(true).map_err(bind_err)?;
        socket.bind(sock_addr).map_err(bind_err)?;
        let inner = socket.listen(BACKLOG).map_err(bind_err)?;

        let local = inner.local_addr().map_err(bind_err)?;
        let identity = tokio::task::spawn_blocking(move || ServerIdentity::resolve(local))
            .await
            .unwrap_or_else(|_| ServerIdentity::new(local, local.ip().to_string()));

        Ok(Self {
            inner,
            identity: Arc::new(identity),
        })
    }

    /// Waits for exactly one client.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr)> {
        Ok(self.inner.accept().await?)
    }

    pub fn identity(&self) -> Arc<ServerIdentity> {
        Arc::clone(&self.identity)
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.identity.address()
    }

    /// Serves connections one after another, forever.
    ///
    /// Each connection is handled to completion before the next accept.
    /// A failed request is logged and the loop carries on.
    pub async fn serve<A>(self, app: &A, options: ConnectionOptions) -> Result<()>
    where
        A: Application + ?Sized,
    {
        info!(
            addr = %self.identity.address(),
            server_name = self.identity.name(),
            "Serving HTTP"
        );

        loop {
            let (socket, peer) = match self.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Accept failed: {}", e);
                    tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                    continue;
                }
            };
            info!("Accepted connection from {}", peer);

            let conn = Connection::new(socket, self.identity(), options.clone());
            if let Err(e) = conn.run(app).await {
                error!("Connection error from {}: {}", peer, e);
            }
        }
    }
}
