use std::io;

use crate::http::parser::ParseError;

/// Errors produced while serving.
///
/// `Bind` is fatal at startup. Every other variant is local to one
/// connection: the connection is closed and the accept loop moves on.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed request: {0}")]
    MalformedRequest(#[from] ParseError),

    #[error("application returned without declaring a response")]
    MissingResponseDeclaration,

    #[error("application declared a response more than once")]
    DuplicateResponseDeclaration,

    #[error("invalid response declaration: {0}")]
    InvalidResponseDeclaration(String),

    #[error("application failed: {0:#}")]
    Application(anyhow::Error),

    #[error("socket error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
