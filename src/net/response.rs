//! Minimal response model.
//!
//! This struct represents a **fully buffered and decoded** response returned by
//! the fetch engine, whatever the scheme it came from.
//!
//! ## Notes
//! - `data:` and `file:` responses always carry status `200` and no headers.
//! - `headers` is an `http::HeaderMap`, which is **case-insensitive** for
//!   header names. The engine keeps a single value per name; when a response
//!   repeats a header, the last occurrence is the one kept.
//! - The body has already been un-gzipped and decoded as UTF-8.
//!
use http::HeaderMap;

/// Simple structure for responses.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Numeric status code (e.g., `200`, `404`).
    pub status: u16,

    /// Response headers, one value per name.
    pub headers: HeaderMap,

    /// Decoded response body.
    pub body: String,
}

impl Response {
    /// A `200` response without headers, as produced for local schemes.
    pub fn local(body: String) -> Self {
        Self {
            status: 200,
            headers: HeaderMap::new(),
            body,
        }
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }
}

/// A loaded document, as handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Identifier of the final, non-redirect response.
    pub url: String,

    pub body: String,

    /// `true` when the page was requested with a `view-source:` prefix and
    /// should be shown as markup rather than rendered.
    pub view_source: bool,
}
