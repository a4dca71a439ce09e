//! Line level helpers shared by the request parser and the response head decoder.

use http::{HeaderName, HeaderValue};

/// Splits a head into lines on `\n`, trimming surrounding whitespace (and so any `\r`).
pub(crate) fn head_lines(head: &[u8]) -> impl Iterator<Item = &[u8]> {
    head.split(|b| *b == b'\n').map(<[u8]>::trim_ascii)
}

/// Parses one `name: value` line.
///
/// The line is split on the first `:`; both halves are trimmed and the name is
/// lower-cased. Returns `None` for lines without a colon, and for names or values
/// that are not representable as HTTP header fields. Callers skip those lines.
pub(crate) fn parse_header_line(line: &[u8]) -> Option<(HeaderName, HeaderValue)> {
    let colon = line.iter().position(|b| *b == b':')?;
    let name = HeaderName::from_bytes(line[..colon].trim_ascii()).ok()?;
    let value = HeaderValue::from_bytes(line[colon + 1..].trim_ascii()).ok()?;
    Some((name, value))
}

/// Returns the length of the client request head, terminator included.
///
/// Both `\r\n\r\n` and a bare `\n\n` end a request head.
pub(crate) fn find_request_head_end(buf: &[u8]) -> Option<usize> {
    let crlf = buf.windows(4).position(|w| w == b"\r\n\r\n").map(|pos| pos + 4);
    let lf = buf.windows(2).position(|w| w == b"\n\n").map(|pos| pos + 2);
    match (crlf, lf) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}
