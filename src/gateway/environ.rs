//! Per-request gateway environment.
//!
//! The environment maps fixed keys to values: protocol metadata under
//! `gateway.*` and CGI-style variables in upper case. It is built once per
//! request and never changed afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};

use bytes::buf::Reader;
use bytes::{Buf, Bytes};

use crate::http::request::{RawRequest, RequestLine};
use crate::server::identity::ServerIdentity;

pub mod keys {
    pub const VERSION: &str = "gateway.version";
    pub const URL_SCHEME: &str = "gateway.url_scheme";
    pub const MULTITHREAD: &str = "gateway.multithread";
    pub const MULTIPROCESS: &str = "gateway.multiprocess";
    pub const RUN_ONCE: &str = "gateway.run_once";

    pub const REQUEST_METHOD: &str = "REQUEST_METHOD";
    pub const PATH_INFO: &str = "PATH_INFO";
    pub const QUERY_STRING: &str = "QUERY_STRING";
    pub const SERVER_NAME: &str = "SERVER_NAME";
    pub const SERVER_PORT: &str = "SERVER_PORT";
    pub const SERVER_PROTOCOL: &str = "SERVER_PROTOCOL";
}

/// Version of the gateway protocol spoken with applications.
pub const GATEWAY_VERSION: (u32, u32) = (1, 0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvValue {
    Text(String),
    Flag(bool),
    Version(u32, u32),
}

impl EnvValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            EnvValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            EnvValue::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvValue::Text(s) => f.write_str(s),
            EnvValue::Flag(b) => write!(f, "{}", b),
            EnvValue::Version(major, minor) => write!(f, "({}, {})", major, minor),
        }
    }
}

/// Request environment handed to applications.
///
/// Two environments built from the same request line, raw bytes and
/// server identity compare equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environ {
    vars: BTreeMap<&'static str, EnvValue>,
    input: Bytes,
}

impl Environ {
    /// Assembles the environment for one request. Performs no I/O.
    pub fn build(line: &RequestLine, raw: &RawRequest, identity: &ServerIdentity) -> Self {
        let mut vars = BTreeMap::new();

        let (major, minor) = GATEWAY_VERSION;
        vars.insert(keys::VERSION, EnvValue::Version(major, minor));
        vars.insert(keys::URL_SCHEME, EnvValue::Text("http".to_string()));
        vars.insert(keys::MULTITHREAD, EnvValue::Flag(false));
        vars.insert(keys::MULTIPROCESS, EnvValue::Flag(false));
        vars.insert(keys::RUN_ONCE, EnvValue::Flag(false));

        vars.insert(keys::REQUEST_METHOD, EnvValue::Text(line.method.clone()));
        vars.insert(keys::PATH_INFO, EnvValue::Text(line.path.clone()));
        vars.insert(
            keys::QUERY_STRING,
            EnvValue::Text(query_string(&line.path)),
        );
        vars.insert(keys::SERVER_PROTOCOL, EnvValue::Text(line.version.clone()));
        vars.insert(keys::SERVER_NAME, EnvValue::Text(identity.name().to_string()));
        vars.insert(keys::SERVER_PORT, EnvValue::Text(identity.port().to_string()));

        Self {
            vars,
            input: raw.bytes(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&EnvValue> {
        self.vars.get(key)
    }

    /// Text value of `key`, `None` if missing or not text.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(EnvValue::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &EnvValue)> {
        self.vars.iter().map(|(k, v)| (*k, v))
    }

    pub fn request_method(&self) -> &str {
        self.text(keys::REQUEST_METHOD).unwrap_or_default()
    }

    pub fn path_info(&self) -> &str {
        self.text(keys::PATH_INFO).unwrap_or_default()
    }

    pub fn query_string(&self) -> &str {
        self.text(keys::QUERY_STRING).unwrap_or_default()
    }

    pub fn server_name(&self) -> &str {
        self.text(keys::SERVER_NAME).unwrap_or_default()
    }

    pub fn server_port(&self) -> &str {
        self.text(keys::SERVER_PORT).unwrap_or_default()
    }

    /// Input stream over the raw request bytes (`gateway.input`).
    ///
    /// Each call starts again from the first byte.
    pub fn input(&self) -> Reader<Bytes> {
        self.input.clone().reader()
    }

    /// Error stream for the application (`gateway.errors`).
    pub fn errors(&self) -> ErrorStream {
        ErrorStream
    }
}

/// Query component of the request path, empty when there is none.
fn query_string(path: &str) -> String {
    url::Url::parse("http://localhost/")
        .and_then(|url| url.join(path))
        .ok()
        .and_then(|url| url.query().map(str::to_owned))
        .unwrap_or_default()
}

/// Writes application diagnostics to the server log, one event per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorStream;

impl Write for ErrorStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            tracing::warn!(source = "application", "{}", line);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
