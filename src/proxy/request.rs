//! Request Parsing
//!
//! Request-line and URI parsing plus the header rewrite applied before a
//! request is forwarded to the origin.

use crate::error::ProxyError;

/// User-Agent sent to every origin regardless of the client's.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:10.0.3) Gecko/20120305 Firefox/10.0.3";

const DEFAULT_PORT: u16 = 80;

// == Request Line ==
/// First line of a client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub uri: String,
    pub version: String,
}

impl RequestLine {
    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }
}

/// Splits `METHOD URI VERSION`, tolerating a trailing CRLF.
pub fn parse_request_line(line: &str) -> Result<RequestLine, ProxyError> {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(uri), Some(version), None) => Ok(RequestLine {
            method: method.to_string(),
            uri: uri.to_string(),
            version: version.to_string(),
        }),
        _ => Err(ProxyError::BadRequest(format!(
            "malformed request line: {:?}",
            line.trim_end()
        ))),
    }
}

// == Target ==
/// Origin server and path addressed by an absolute `http://` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Target {
    /// Value for the `Host` header.
    pub fn authority(&self) -> String {
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        if self.port == DEFAULT_PORT {
            host
        } else {
            format!("{}:{}", host, self.port)
        }
    }
}

/// Parses `http://host[:port][/path]`.
///
/// IPv6 hosts must be bracketed, as in `http://[::1]:8080/`.
pub fn parse_uri(uri: &str) -> Result<Target, ProxyError> {
    let bad = |what: &str| ProxyError::BadRequest(format!("{} in uri: {}", what, uri));

    let rest = uri
        .get(..7)
        .filter(|scheme| scheme.eq_ignore_ascii_case("http://"))
        .map(|_| &uri[7..])
        .ok_or_else(|| ProxyError::BadRequest(format!("unsupported uri: {}", uri)))?;

    let (authority, path) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, "/"),
    };

    let (host, port) = match authority.strip_prefix('[') {
        Some(bracketed) => {
            let (host, after) = bracketed
                .split_once(']')
                .ok_or_else(|| bad("unterminated IPv6 address"))?;
            let port = match after {
                "" => None,
                _ => Some(after.strip_prefix(':').ok_or_else(|| bad("invalid port"))?),
            };
            (host, port)
        }
        None => match authority.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (authority, None),
        },
    };

    if host.is_empty() {
        return Err(bad("missing host"));
    }
    if host.contains(['[', ']']) || (host.contains(':') && !authority.starts_with('[')) {
        return Err(bad("invalid host"));
    }
    let port = match port {
        Some(port) => port.parse().map_err(|_| bad("invalid port"))?,
        None => DEFAULT_PORT,
    };

    Ok(Target {
        host: host.to_string(),
        port,
        path: path.to_string(),
    })
}

// == Header Rewrite ==
fn header_name(line: &str) -> &str {
    line.split(':').next().unwrap_or("").trim()
}

/// Builds the HTTP/1.0 request forwarded to the origin.
///
/// Client headers pass through except `User-Agent`, `Connection` and
/// `Proxy-Connection`, which are replaced. `Host` is kept if the client sent
/// one, otherwise it is derived from the URI.
pub fn build_upstream_request(target: &Target, client_headers: &[String]) -> String {
    let mut out = format!("GET {} HTTP/1.0\r\n", target.path);
    let mut has_host = false;

    for line in client_headers {
        let name = header_name(line);
        if name.eq_ignore_ascii_case("host") {
            has_host = true;
        } else if ["user-agent", "connection", "proxy-connection"]
            .iter()
            .any(|h| name.eq_ignore_ascii_case(h))
        {
            continue;
        }
        out.push_str(line);
        out.push_str("\r\n");
    }

    if !has_host {
        out.push_str(&format!("Host: {}\r\n", target.authority()));
    }
    out.push_str(&format!("User-Agent: {}\r\n", USER_AGENT));
    out.push_str("Connection: close\r\n");
    out.push_str("Proxy-Connection: close\r\n");
    out.push_str("\r\n");
    out
}
