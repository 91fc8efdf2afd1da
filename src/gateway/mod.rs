//! Application boundary.
//!
//! An application receives the request [`Environ`] together with a
//! [`StartResponse`] callback. It must declare its status and headers
//! exactly once through the callback and return the response [`Body`]:
//! a finite sequence of byte fragments that the server drains once.

pub mod apps;
pub mod environ;

use std::panic::{self, AssertUnwindSafe};

use bytes::Bytes;

use crate::error::{Result, ServerError};
use crate::http::response::{ResponseDeclaration, StartResponse};

pub use environ::{EnvValue, Environ};

/// Response body returned by an application.
///
/// Each item is one fragment. An `Err` item aborts the request.
pub type Body = Box<dyn Iterator<Item = anyhow::Result<Bytes>> + Send>;

pub trait Application: Send + Sync {
    fn call(&self, environ: &Environ, start_response: &mut StartResponse)
        -> anyhow::Result<Body>;
}

impl<F> Application for F
where
    F: Fn(&Environ, &mut StartResponse) -> anyhow::Result<Body> + Send + Sync,
{
    fn call(
        &self,
        environ: &Environ,
        start_response: &mut StartResponse,
    ) -> anyhow::Result<Body> {
        self(environ, start_response)
    }
}

/// Builds a [`Body`] out of infallible fragments.
///
/// ```
/// # use minigate::gateway::body;
/// let chunks: Vec<_> = body(["Hello", "World"]).map(|c| c.unwrap()).collect();
/// assert_eq!(chunks, ["Hello", "World"]);
/// ```
pub fn body<I, B>(fragments: I) -> Body
where
    I: IntoIterator<Item = B>,
    I::IntoIter: Send + 'static,
    B: Into<Bytes>,
{
    Box::new(fragments.into_iter().map(|fragment| Ok(fragment.into())))
}

/// Calls the application and checks that it declared a response.
///
/// The application failing, panicking, or returning without a declaration
/// are all reported as errors. Nothing is retried.
pub fn invoke<A>(app: &A, environ: &Environ) -> Result<(ResponseDeclaration, Body)>
where
    A: Application + ?Sized,
{
    let mut start_response = StartResponse::new();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        app.call(environ, &mut start_response)
    }));

    let body = match outcome {
        Ok(result) => result.map_err(ServerError::Application)?,
        Err(payload) => return Err(panicked(payload)),
    };

    let declaration = start_response.into_declaration()?;
    Ok((declaration, body))
}

/// Drains a body into one buffer, in order.
///
/// Only called once a response has been declared.
pub fn collect_body(body: Body) -> Result<Vec<Bytes>> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(move || {
        body.collect::<anyhow::Result<Vec<Bytes>>>()
    }));

    match outcome {
        Ok(result) => result.map_err(ServerError::Application),
        Err(payload) => Err(panicked(payload)),
    }
}

fn panicked(payload: Box<dyn std::any::Any + Send>) -> ServerError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());

    ServerError::Application(anyhow::anyhow!("application panicked: {}", message))
}
