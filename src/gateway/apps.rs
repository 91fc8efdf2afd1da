//! Built-in applications, addressed as `module:callable`.

use std::io::{Read, Write};

use bytes::Bytes;

use crate::gateway::{body, Application, Body, Environ};
use crate::http::response::StartResponse;

/// Names accepted by [`lookup`].
pub const AVAILABLE: &[&str] = &["demo:hello", "demo:environ", "demo:echo"];

/// Resolves a `module:callable` reference to an application.
pub fn lookup(reference: &str) -> anyhow::Result<Box<dyn Application>> {
    let (module, callable) = reference
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("Provide an application as module:callable, got {:?}", reference))?;

    let app: Box<dyn Application> = match (module, callable) {
        ("demo", "hello") => Box::new(hello),
        ("demo", "environ") => Box::new(environ),
        ("demo", "echo") => Box::new(echo),
        _ => anyhow::bail!(
            "unknown application {:?} (available: {})",
            reference,
            AVAILABLE.join(", ")
        ),
    };
    Ok(app)
}

/// Greets whoever is at `PATH_INFO`.
pub fn hello(env: &Environ, start_response: &mut StartResponse) -> anyhow::Result<Body> {
    start_response.declare("200 OK", [("Content-Type", "text/plain")])?;
    Ok(body([
        Bytes::from_static(b"Hello from "),
        Bytes::from(env.path_info().to_string()),
        Bytes::from_static(b"\n"),
    ]))
}

/// Lists the request environment, one `KEY = value` line per entry.
pub fn environ(env: &Environ, start_response: &mut StartResponse) -> anyhow::Result<Body> {
    let lines: Vec<Bytes> = env
        .iter()
        .map(|(key, value)| Bytes::from(format!("{} = {}\n", key, value)))
        .collect();

    start_response.declare("200 OK", [("Content-Type", "text/plain")])?;
    Ok(body(lines))
}

/// Sends back the raw request it received.
pub fn echo(env: &Environ, start_response: &mut StartResponse) -> anyhow::Result<Body> {
    let mut raw = Vec::new();
    env.input().read_to_end(&mut raw)?;

    if raw.is_empty() {
        writeln!(env.errors(), "echo: empty request input")?;
    }

    start_response.declare(
        "200 OK",
        [
            ("Content-Type", "application/octet-stream".to_string()),
            ("Content-Length", raw.len().to_string()),
        ],
    )?;
    Ok(body([raw]))
}
