//! Turns a client request, or a redirect `Location`, into the [`Target`] of the next hop.
//!
//! Only plain `http` URLs are understood. `https` and every other scheme are rejected
//! rather than downgraded. A request in origin form (`GET /path`) is resolved through
//! its `Host` header as if the client had written `http://<host><path>`.

use crate::protocol::{DEFAULT_HTTP_PORT, ProxyRequest, ResolveError, Target};
use crate::utils::ensure;

const SCHEME_SEPARATOR: &str = "://";

/// Resolves the first hop of a client request.
///
/// An absolute-URI on the request line wins over any `Host` header.
///
/// # Errors
///
/// - [`ResolveError::MissingHost`] / [`ResolveError::InvalidHostHeader`] when an
///   origin-form request has no usable `Host`
/// - [`ResolveError::InvalidPath`] for a relative path that does not start with `/`
/// - everything [`resolve_url`] can return
pub fn resolve_request(request: &ProxyRequest) -> Result<Target, ResolveError> {
    let path = request.path();
    if !request.is_origin_form() {
        ensure!(path.contains(SCHEME_SEPARATOR), ResolveError::InvalidPath { path: path.to_string() });
        return resolve_url(path);
    }

    let host = request.host().ok_or(ResolveError::MissingHost)?;
    let host = host.to_str().map_err(|_| ResolveError::InvalidHostHeader)?.trim();
    ensure!(!host.is_empty(), ResolveError::MissingHost);

    resolve_url(&format!("http://{host}{path}"))
}

/// Resolves an absolute `http://authority/path` URL.
///
/// The port defaults to 80 and the path to `/`. The path keeps its query string.
///
/// # Errors
///
/// - [`ResolveError::InvalidUrl`] if there is no `://`
/// - [`ResolveError::UnsupportedScheme`] for anything but `http`
/// - [`ResolveError::EmptyHost`] / [`ResolveError::InvalidPort`] for a bad authority
pub fn resolve_url(url: &str) -> Result<Target, ResolveError> {
    let Some((scheme, rest)) = url.split_once(SCHEME_SEPARATOR) else {
        return Err(ResolveError::invalid_url(url));
    };
    ensure!(scheme.eq_ignore_ascii_case("http"), ResolveError::unsupported_scheme(scheme));

    let (authority, path) = match rest.find('/') {
        Some(slash) => rest.split_at(slash),
        None => (rest, "/"),
    };

    let (host, port) = split_authority(authority)?;
    ensure!(!host.is_empty(), ResolveError::EmptyHost);

    Ok(Target::new(host, port, path))
}

/// Splits `host[:port]`, keeping the brackets of an IPv6 literal in the host.
fn split_authority(authority: &str) -> Result<(&str, u16), ResolveError> {
    let (host, port) = if authority.starts_with('[') {
        let Some(end) = authority.find(']') else {
            return Err(ResolveError::invalid_url(authority));
        };
        let (host, rest) = authority.split_at(end + 1);
        match rest.strip_prefix(':') {
            Some(port) => (host, Some(port)),
            None if rest.is_empty() => (host, None),
            None => return Err(ResolveError::invalid_url(authority)),
        }
    } else {
        match authority.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (authority, None),
        }
    };

    let port = match port {
        Some(port) => parse_port(port)?,
        None => DEFAULT_HTTP_PORT,
    };
    Ok((host, port))
}

fn parse_port(port: &str) -> Result<u16, ResolveError> {
    // u16 parsing also accepts a leading '+'
    ensure!(!port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()), ResolveError::invalid_port(port));
    match port.parse::<u16>() {
        Ok(0) | Err(_) => Err(ResolveError::invalid_port(port)),
        Ok(port) => Ok(port),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::parse_request;

    fn request(head: &str) -> ProxyRequest {
        parse_request(head.as_bytes()).unwrap()
    }

    #[test]
    fn relative_path_uses_host_header() {
        let target = resolve_request(&request("GET /index.html HTTP/1.0\r\nHost: example.org:8080\r\n\r\n")).unwrap();
        assert_eq!(target, Target::new("example.org", 8080, "/index.html"));
    }

    #[test]
    fn absolute_uri_ignores_host_header() {
        let target = resolve_request(&request("GET http://a.b/c/d?e HTTP/1.0\r\nHost: other.example:9\r\n\r\n")).unwrap();
        assert_eq!(target, Target::new("a.b", 80, "/c/d?e"));
    }

    #[test]
    fn host_header_without_port() {
        let target = resolve_request(&request("GET / HTTP/1.0\r\nhost:  example.org \r\n\r\n")).unwrap();
        assert_eq!(target, Target::new("example.org", 80, "/"));
    }

    #[test]
    fn missing_host() {
        assert_eq!(resolve_request(&request("GET /x HTTP/1.0\r\n\r\n")), Err(ResolveError::MissingHost));
    }

    #[test]
    fn relative_path_without_slash() {
        let result = resolve_request(&request("GET index.html HTTP/1.0\r\nHost: a.b\r\n\r\n"));
        assert!(matches!(result, Err(ResolveError::InvalidPath { .. })));
    }

    #[test]
    fn url_inside_query_stays_in_path() {
        let target = resolve_request(&request("GET /go?to=http://x.y/ HTTP/1.0\r\nHost: a.b\r\n\r\n")).unwrap();
        assert_eq!(target, Target::new("a.b", 80, "/go?to=http://x.y/"));
    }

    #[test]
    fn empty_path_becomes_root() {
        assert_eq!(resolve_url("http://a.b").unwrap(), Target::new("a.b", 80, "/"));
        assert_eq!(resolve_url("http://a.b:81").unwrap(), Target::new("a.b", 81, "/"));
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert_eq!(resolve_url("HTTP://a.b/x").unwrap(), Target::new("a.b", 80, "/x"));
    }

    #[test]
    fn https_is_rejected() {
        assert_eq!(resolve_url("https://a.b/"), Err(ResolveError::unsupported_scheme("https")));
        assert_eq!(resolve_url("ftp://a.b/"), Err(ResolveError::unsupported_scheme("ftp")));
    }

    #[test]
    fn not_a_url() {
        assert!(matches!(resolve_url("/relative/location"), Err(ResolveError::InvalidUrl { .. })));
    }

    #[test]
    fn bad_ports() {
        for url in ["http://a.b:/", "http://a.b:0/", "http://a.b:65536/", "http://a.b:abc/", "http://a.b:+80/"] {
            assert!(matches!(resolve_url(url), Err(ResolveError::InvalidPort { .. })), "{url}");
        }
        assert_eq!(resolve_url("http://a.b:65535/").unwrap().port(), 65535);
    }

    #[test]
    fn empty_host() {
        assert_eq!(resolve_url("http:///path"), Err(ResolveError::EmptyHost));
        assert_eq!(resolve_url("http://:8080/path"), Err(ResolveError::EmptyHost));
    }

    #[test]
    fn ipv6_literal() {
        assert_eq!(resolve_url("http://[::1]:8080/x").unwrap(), Target::new("[::1]", 8080, "/x"));
        assert_eq!(resolve_url("http://[::1]/").unwrap(), Target::new("[::1]", 80, "/"));
        assert!(resolve_url("http://[::1/").is_err());
    }
}
