//! Proxy Worker
//!
//! Handles one client connection: serves cache hits directly, otherwise
//! relays the request to the origin and offers the response to the cache.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, CacheStore};
use crate::error::{CacheError, ProxyError};
use crate::proxy::request::{build_upstream_request, parse_request_line, parse_uri, Target};

const RELAY_CHUNK: usize = 8192;

/// Serves a single client connection to completion.
///
/// Protocol errors detected before any response bytes are sent are answered
/// with an HTML error page; the error is still returned for logging.
pub fn serve(
    stream: TcpStream,
    store: &CacheStore,
    upstream_timeout: Duration,
) -> Result<(), ProxyError> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = stream;

    let result = handle(&mut reader, &mut writer, store, upstream_timeout);
    if let Err(err) = &result {
        if !matches!(err, ProxyError::Io(_)) {
            let (code, reason) = err.status();
            if let Err(io) = write_client_error(&mut writer, code, reason, &err.to_string()) {
                debug!(error = %io, "failed to write error page");
            }
        }
    }
    result
}

fn handle<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    store: &CacheStore,
    upstream_timeout: Duration,
) -> Result<(), ProxyError> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(());
    }
    let request = parse_request_line(&line)?;
    let headers = read_headers(reader)?;

    if !request.is_get() {
        return Err(ProxyError::NotImplemented(request.method));
    }
    let target = parse_uri(&request.uri)?;

    if let Some(cached) = store.lookup(&request.uri) {
        writer.write_all(cached.read())?;
        writer.flush()?;
        info!(uri = %request.uri, size = cached.size(), "cache hit");
        cached.release();
        return Ok(());
    }

    debug!(uri = %request.uri, "cache miss");
    let upstream_request = build_upstream_request(&target, &headers);
    let limit = store.per_object_limit();
    let response = fetch(&target, &upstream_request, writer, limit, upstream_timeout)?;

    if let Some(body) = response {
        let size = body.len();
        match store.admit_entry(CacheEntry::from_vec(request.uri.as_str(), body)) {
            Ok(()) => info!(uri = %request.uri, size, "cached response"),
            Err(err) => debug!(uri = %request.uri, error = %err, "response not cached"),
        }
    }
    Ok(())
}

/// Reads header lines up to the blank line, without line terminators.
fn read_headers<R: BufRead>(reader: &mut R) -> Result<Vec<String>, ProxyError> {
    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            break;
        }
        headers.push(line.to_string());
    }
    Ok(headers)
}

/// Forwards the request and relays the origin response byte for byte.
///
/// Returns the complete response when it is cacheable: a `200` status and
/// fewer than `limit` bytes in total.
fn fetch<W: Write>(
    target: &Target,
    request: &str,
    client: &mut W,
    limit: usize,
    timeout: Duration,
) -> Result<Option<Vec<u8>>, ProxyError> {
    let upstream_err = |source: std::io::Error| ProxyError::Upstream {
        host: target.host.clone(),
        port: target.port,
        source,
    };

    let mut origin =
        TcpStream::connect((target.host.as_str(), target.port)).map_err(upstream_err)?;
    origin
        .set_read_timeout(Some(timeout))
        .map_err(upstream_err)?;
    origin
        .set_write_timeout(Some(timeout))
        .map_err(upstream_err)?;
    origin.write_all(request.as_bytes()).map_err(upstream_err)?;

    let mut buffer = Some(Vec::new());
    let mut chunk = [0u8; RELAY_CHUNK];
    let mut relayed = 0usize;
    loop {
        let n = match origin.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if relayed == 0 => return Err(upstream_err(err)),
            Err(err) => {
                warn!(host = %target.host, error = %err, "origin read failed mid-response");
                return Ok(None);
            }
        };
        client.write_all(&chunk[..n])?;
        relayed += n;

        buffer_chunk(&mut buffer, &chunk[..n], limit);
    }
    client.flush()?;

    Ok(buffer.filter(|buf| is_ok_status(buf)))
}

/// Appends a relayed chunk to the cache candidate.
///
/// The candidate is abandoned once the response reaches `limit` bytes or the
/// buffer cannot grow; relaying continues either way.
fn buffer_chunk(buffer: &mut Option<Vec<u8>>, chunk: &[u8], limit: usize) {
    let Some(buf) = buffer.as_mut() else {
        return;
    };
    let wanted = buf.len() + chunk.len();
    if wanted >= limit {
        *buffer = None;
        return;
    }
    if buf.try_reserve(chunk.len()).is_err() {
        let err = CacheError::Allocation { size: wanted };
        warn!(error = %err, "response will not be cached");
        *buffer = None;
        return;
    }
    buf.extend_from_slice(chunk);
}

fn is_ok_status(response: &[u8]) -> bool {
    let status_line = response.split(|&b| b == b'\n').next().unwrap_or_default();
    let mut parts = status_line.split(|&b| b == b' ');
    let version = parts.next().unwrap_or_default();
    let code = parts.next().unwrap_or_default();
    let code = code.strip_suffix(b"\r").unwrap_or(code);
    version.starts_with(b"HTTP/") && code == b"200"
}

/// Writes a small HTML error response.
fn write_client_error<W: Write>(
    writer: &mut W,
    code: u16,
    reason: &str,
    detail: &str,
) -> std::io::Result<()> {
    let body = format!(
        "<html><title>Proxy Error</title><body bgcolor=\"ffffff\">\r\n\
         {code}: {reason}\r\n\
         <p>{detail}\r\n\
         <hr><em>Caching web proxy</em>\r\n</body></html>\r\n"
    );
    write!(
        writer,
        "HTTP/1.0 {code} {reason}\r\n\
         Content-type: text/html\r\n\
         Content-length: {}\r\n\r\n{body}",
        body.len()
    )?;
    writer.flush()
}
