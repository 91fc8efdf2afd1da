use std::net::{IpAddr, SocketAddr};

/// Where the server listens, as seen by applications.
///
/// Resolved once from the bound socket and shared read-only by every
/// request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerIdentity {
    address: SocketAddr,
    name: String,
}

impl ServerIdentity {
    pub fn new(address: SocketAddr, name: impl Into<String>) -> Self {
        Self {
            address,
            name: name.into(),
        }
    }

    /// Resolves the fully-qualified name of `address`.
    ///
    /// Blocks on the system resolver.
    pub fn resolve(address: SocketAddr) -> Self {
        Self::new(address, fqdn(address.ip()))
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn port(&self) -> u16 {
        self.address.port()
    }
}

/// Fully-qualified name of `ip`, falling back to its textual form.
///
/// An unspecified address stands for this host: its host name is looked up
/// and the first dotted name its addresses map back to is preferred.
fn fqdn(ip: IpAddr) -> String {
    if !ip.is_unspecified() {
        return dns_lookup::lookup_addr(&ip).unwrap_or_else(|_| ip.to_string());
    }

    match dns_lookup::get_hostname() {
        Ok(host) => qualify(&host).unwrap_or(host),
        Err(_) => ip.to_string(),
    }
}

fn qualify(host: &str) -> Option<String> {
    dns_lookup::lookup_host(host)
        .ok()?
        .into_iter()
        .filter_map(|addr| dns_lookup::lookup_addr(&addr).ok())
        .find(|name| name.contains('.'))
}
