use crate::http::request::{RawRequest, RequestLine};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty request")]
    Empty,
    #[error("expected 3 tokens in request line, found {0}")]
    TokenCount(usize),
}

/// Splits the first line of a request into method, path and version.
///
/// Tokens are separated by ASCII whitespace only and decoded as
/// ISO-8859-1. Headers and body are left alone.
pub fn parse_request_line(raw: &RawRequest) -> Result<RequestLine, ParseError> {
    let buf = raw.as_bytes();
    if buf.is_empty() {
        return Err(ParseError::Empty);
    }

    let first_line = buf
        .split(|&b| b == b'\n')
        .next()
        .ok_or(ParseError::Empty)?;

    let line = first_line
        .strip_suffix(b"\r")
        .unwrap_or(first_line);

    let parts: Vec<&[u8]> = line
        .split(u8::is_ascii_whitespace)
        .filter(|token| !token.is_empty())
        .collect();
    match parts.as_slice() {
        [method, path, version] => Ok(RequestLine {
            method: latin1(method),
            path: latin1(path),
            version: latin1(version),
        }),
        other => Err(ParseError::TokenCount(other.len())),
    }
}

/// Decodes bytes as ISO-8859-1, one char per byte, so nothing is lost.
fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
