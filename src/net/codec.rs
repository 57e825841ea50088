//! HTTP/1.1 wire codec.
//!
//! Just enough of HTTP/1.1 to issue a `GET` and read back one response from a
//! kept-alive connection: status line, headers, a body framed either by
//! `Content-Length` or by chunked transfer encoding, and optional gzip content
//! encoding. Every other transfer or content encoding is refused.
//!
//! All readers work on any [`BufRead`], so they can be fed from a socket or from
//! a byte slice in tests.

use std::io::{self, BufRead, Read};

use flate2::read::GzDecoder;
use http::header::{CONTENT_ENCODING, CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderName, HeaderValue};

use crate::errors::FetchError;
use crate::net::identifier::Remote;

const CRLF: &[u8] = b"\r\n";

/// Serializes the `GET` request for `remote`.
pub fn build_request(remote: &Remote, user_agent: &str) -> Vec<u8> {
    let mut request = format!("GET {} HTTP/1.1\r\n", remote.path);
    for (name, value) in [
        ("Host", remote.host.as_str()),
        ("User-Agent", user_agent),
        ("Accept-Encoding", "gzip"),
    ] {
        request.push_str(&format!("{name}: {value}\r\n"));
    }
    request.push_str("\r\n");
    request.into_bytes()
}

/// Reads the status line and returns the numeric status code.
pub fn read_status<R: BufRead>(reader: &mut R) -> Result<u16, FetchError> {
    let line = read_line(reader)?;
    if line.is_empty() {
        return Err(FetchError::ConnectionClosed);
    }

    let line = as_text(&line, "status line")?;
    let mut parts = line.trim_end_matches(['\r', '\n']).splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    let status = parts.next().unwrap_or_default();

    if !version.starts_with("HTTP/") {
        return Err(FetchError::violation(format!("bad status line: {line:?}")));
    }
    status
        .parse::<u16>()
        .map_err(|_| FetchError::violation(format!("bad status code: {status:?}")))
}

/// Reads header lines up to the blank line ending the header block.
///
/// Names are lower-cased and values trimmed. A repeated header overwrites the
/// previous occurrence.
pub fn read_headers<R: BufRead>(reader: &mut R) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();

    loop {
        let line = read_line(reader)?;
        if line.is_empty() {
            return Err(FetchError::ConnectionClosed);
        }
        if line == CRLF || line == b"\n" {
            break;
        }

        let line = as_text(&line, "header line")?;
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| FetchError::violation(format!("header without colon: {line:?}")))?;

        let name = HeaderName::from_bytes(name.trim().to_ascii_lowercase().as_bytes())
            .map_err(|_| FetchError::violation(format!("invalid header name: {name:?}")))?;
        let value = HeaderValue::from_bytes(value.trim().as_bytes())
            .map_err(|_| FetchError::violation(format!("invalid value for header {name}")))?;

        headers.insert(name, value);
    }

    Ok(headers)
}

/// Reads the raw (still content-encoded) body framed as `headers` describe.
pub fn read_body<R: BufRead>(reader: &mut R, headers: &HeaderMap) -> Result<Vec<u8>, FetchError> {
    if let Some(encoding) = headers.get(TRANSFER_ENCODING) {
        let encoding = header_str(encoding);
        if !encoding.eq_ignore_ascii_case("chunked") {
            return Err(FetchError::violation(format!("unsupported transfer-encoding: {encoding}")));
        }
        return read_chunked(reader);
    }

    let length = headers
        .get(CONTENT_LENGTH)
        .ok_or_else(|| FetchError::violation("response has neither content-length nor chunked framing"))?;
    let length = header_str(length)
        .parse::<u64>()
        .map_err(|_| FetchError::violation(format!("bad content-length: {}", header_str(length))))?;

    let mut body = Vec::new();
    read_up_to(reader, length, &mut body)?;
    Ok(body)
}

/// Undoes the content encoding and decodes the body as UTF-8.
pub fn decode_body(body: Vec<u8>, headers: &HeaderMap) -> Result<String, FetchError> {
    let body = match headers.get(CONTENT_ENCODING) {
        None => body,
        Some(encoding) if header_str(encoding).eq_ignore_ascii_case("gzip") => {
            let mut inflated = Vec::new();
            GzDecoder::new(body.as_slice())
                .read_to_end(&mut inflated)
                .map_err(|e| FetchError::DecodeError(format!("gzip: {e}")))?;
            inflated
        }
        Some(encoding) => {
            return Err(FetchError::violation(format!(
                "unsupported content-encoding: {}",
                header_str(encoding)
            )))
        }
    };

    String::from_utf8(body).map_err(|e| FetchError::DecodeError(e.to_string()))
}

fn read_chunked<R: BufRead>(reader: &mut R) -> Result<Vec<u8>, FetchError> {
    let mut body = Vec::new();

    loop {
        let line = read_line(reader)?;
        if line.is_empty() {
            return Err(FetchError::ConnectionClosed);
        }

        let line = as_text(&line, "chunk size")?;
        // Chunk extensions follow a ';' and are ignored
        let size = line.split(';').next().unwrap_or_default().trim();
        let size = u64::from_str_radix(size, 16)
            .map_err(|_| FetchError::violation(format!("bad chunk size: {size:?}")))?;

        if size == 0 {
            skip_trailers(reader)?;
            return Ok(body);
        }

        read_up_to(reader, size, &mut body)?;

        let mut terminator = [0u8; 2];
        read_exact(reader, &mut terminator)?;
        if terminator != CRLF {
            return Err(FetchError::violation("chunk not terminated by CRLF"));
        }
    }
}

fn skip_trailers<R: BufRead>(reader: &mut R) -> Result<(), FetchError> {
    loop {
        let line = read_line(reader)?;
        if line.is_empty() {
            return Err(FetchError::ConnectionClosed);
        }
        if line == CRLF || line == b"\n" {
            return Ok(());
        }
    }
}

fn read_line<R: BufRead>(reader: &mut R) -> Result<Vec<u8>, FetchError> {
    let mut line = Vec::new();
    reader.read_until(b'\n', &mut line)?;
    Ok(line)
}

// Appends exactly `len` bytes to `buf`. The buffer only grows by what the peer
// actually sent, never by the announced length.
fn read_up_to<R: Read>(reader: &mut R, len: u64, buf: &mut Vec<u8>) -> Result<(), FetchError> {
    let read = reader.by_ref().take(len).read_to_end(buf)?;
    if (read as u64) < len {
        return Err(FetchError::ConnectionClosed);
    }
    Ok(())
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), FetchError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => FetchError::ConnectionClosed,
        _ => FetchError::Io(e),
    })
}

fn as_text<'a>(line: &'a [u8], what: &str) -> Result<&'a str, FetchError> {
    std::str::from_utf8(line).map_err(|_| FetchError::violation(format!("{what} is not valid UTF-8")))
}

fn header_str(value: &HeaderValue) -> &str {
    value.to_str().unwrap_or_default().trim()
}
