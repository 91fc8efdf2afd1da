//! HTTP side of the gateway.
//!
//! # Architecture
//!
//! - **`connection`**: drives one accepted connection through the pipeline
//! - **`request`**: single-read request capture and the parsed request line
//! - **`parser`**: splits the request line into method, path and version
//! - **`response`**: the response-declaration callback and what it records
//! - **`writer`**: serializes the declared response and sends all of it
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌──────────────┐
//!        │   Accepted   │ ← Read one buffer, parse request line
//!        └──────┬───────┘
//!               ▼
//!        ┌──────────────┐
//!        │    Parsed    │ ← Build the gateway environment
//!        └──────┬───────┘
//!               ▼
//!        ┌──────────────┐
//!        │ ContextBuilt │ ← Invoke application, drain body
//!        └──────┬───────┘
//!               ▼
//!        ┌──────────────┐
//!        │   Declared   │ ← Send response
//!        └──────┬───────┘
//!               ▼
//!        ┌──────────────┐
//!        │    Closed    │ ← Reached from every state, also on failure
//!        └──────────────┘
//! ```
//!
//! There is no keep-alive: one connection carries one request.
//!
//! # Example
//!
//! ```no_run
//! use minigate::gateway::{body, Body, Environ};
//! use minigate::http::connection::ConnectionOptions;
//! use minigate::http::response::StartResponse;
//! use minigate::server::Listener;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = |_: &Environ, start_response: &mut StartResponse| -> anyhow::Result<Body> {
//!         start_response.declare("200 OK", [("Content-Type", "text/plain")])?;
//!         Ok(body(["hi"]))
//!     };
//!
//!     let listener = Listener::bind("127.0.0.1:8888").await?;
//!     listener.serve(&app, ConnectionOptions::default()).await?;
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
