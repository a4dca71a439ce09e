//! Client request head parsing.
//!
//! Turns the bytes of a single request head into a [`ProxyRequest`]. No I/O happens
//! here; framing the head out of the socket is the job of
//! [`RequestDecoder`](crate::codec::RequestDecoder).
//!
//! The parser is deliberately lenient with header lines (a line without a colon is
//! skipped rather than rejected) and strict with the start line, which must consist of
//! exactly three whitespace separated tokens.

use http::{HeaderMap, Method};

use crate::codec::header::lines::{head_lines, parse_header_line};
use crate::protocol::{ParseError, ProxyRequest};

/// Parses a request head.
///
/// Anything after the first empty line is ignored.
///
/// # Errors
///
/// Returns `ParseError::InvalidStartLine` if the first line is missing or does not
/// split into `method path version`, and `ParseError::InvalidMethod` if the method is
/// not a valid token.
pub fn parse_request(src: &[u8]) -> Result<ProxyRequest, ParseError> {
    let mut lines = head_lines(src);

    let start_line = lines.next().unwrap_or_default();
    let start_line = std::str::from_utf8(start_line).map_err(|_| ParseError::invalid_start_line("start line is not utf-8"))?;

    let mut tokens = start_line.split_ascii_whitespace();
    let (Some(method), Some(path), Some(version), None) = (tokens.next(), tokens.next(), tokens.next(), tokens.next()) else {
        return Err(ParseError::invalid_start_line(format!("expected `method path version`, got {start_line:?}")));
    };

    let method = Method::from_bytes(method.as_bytes()).map_err(|_| ParseError::invalid_method(method))?;

    let mut headers = HeaderMap::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = parse_header_line(line) {
            headers.insert(name, value);
        }
    }

    Ok(ProxyRequest::new(method, path, version, headers))
}
