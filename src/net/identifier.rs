//! Resource identifiers.
//!
//! An [`Identifier`] is the parsed form of the URL-like strings the engine
//! accepts:
//!
//! - `data:<tag>,<payload>`
//! - `file://<path>`
//! - `http://host[:port][/path]`
//! - `https://host[:port][/path]`
//!
//! Only network identifiers carry a host, port and path. They also provide the
//! two lookup keys used by the engine: [`ConnectionKey`] (one per origin, shared
//! by every path on it) and [`CacheKey`] (one per exact resource).

use std::fmt;

use crate::config::{HTTPS_PORT, HTTP_PORT};
use crate::errors::FetchError;

const VIEW_SOURCE_PREFIX: &str = "view-source:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
    File,
    Data,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
            Scheme::File => "file",
            Scheme::Data => "data",
        }
    }

    /// Port used when the identifier does not name one. `None` for local schemes.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Scheme::Http => Some(HTTP_PORT),
            Scheme::Https => Some(HTTPS_PORT),
            Scheme::File | Scheme::Data => None,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host, port and path of a network identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Remote {
    pub host: String,
    pub port: u16,
    /// Always starts with `/`
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    Http(Remote),
    Https(Remote),
    File { path: String },
    Data { payload: String },
}

/// Identifies a reusable transport, regardless of the requested path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionKey {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
}

/// Identifies a cacheable response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Identifier {
    pub fn parse(raw: &str) -> Result<Self, FetchError> {
        if let Some(rest) = raw.strip_prefix("data:") {
            // Everything up to the first comma is the media type tag, which we ignore
            let (_tag, payload) = rest
                .split_once(',')
                .ok_or_else(|| FetchError::malformed(format!("data identifier without comma: {raw}")))?;
            return Ok(Identifier::Data { payload: payload.to_string() });
        }

        let (scheme, rest) = raw
            .split_once("://")
            .ok_or_else(|| FetchError::malformed(format!("missing scheme: {raw}")))?;

        match scheme {
            "file" => Ok(Identifier::File {
                path: format!("/{}", rest.trim_start_matches('/')),
            }),
            "http" => Ok(Identifier::Http(parse_remote(rest, HTTP_PORT)?)),
            "https" => Ok(Identifier::Https(parse_remote(rest, HTTPS_PORT)?)),
            other => Err(FetchError::malformed(format!("unsupported scheme: {other}"))),
        }
    }

    pub fn scheme(&self) -> Scheme {
        match self {
            Identifier::Http(_) => Scheme::Http,
            Identifier::Https(_) => Scheme::Https,
            Identifier::File { .. } => Scheme::File,
            Identifier::Data { .. } => Scheme::Data,
        }
    }

    /// Host, port and path for `http` and `https` identifiers.
    pub fn remote(&self) -> Option<&Remote> {
        match self {
            Identifier::Http(remote) | Identifier::Https(remote) => Some(remote),
            Identifier::File { .. } | Identifier::Data { .. } => None,
        }
    }

    pub fn connection_key(&self) -> Option<ConnectionKey> {
        self.remote().map(|r| ConnectionKey {
            scheme: self.scheme(),
            host: r.host.clone(),
            port: r.port,
        })
    }

    pub fn cache_key(&self) -> Option<CacheKey> {
        self.remote().map(|r| CacheKey {
            scheme: self.scheme(),
            host: r.host.clone(),
            port: r.port,
            path: r.path.clone(),
        })
    }

    /// `scheme://host`, with `:port` appended only when it differs from the
    /// scheme default. `None` for local identifiers.
    pub fn origin(&self) -> Option<String> {
        let remote = self.remote()?;
        let scheme = self.scheme();
        if scheme.default_port() == Some(remote.port) {
            Some(format!("{}://{}", scheme, remote.host))
        } else {
            Some(format!("{}://{}:{}", scheme, remote.host, remote.port))
        }
    }

    /// Resolves a redirect `location` against this identifier.
    ///
    /// Absolute-path locations are joined to the origin; anything else is
    /// assumed to be absolute already and returned unchanged.
    pub fn resolve(&self, location: &str) -> Result<String, FetchError> {
        if !location.starts_with('/') {
            return Ok(location.to_string());
        }

        let origin = self.origin().ok_or_else(|| {
            FetchError::malformed(format!("cannot resolve {location} against {self}"))
        })?;
        Ok(format!("{origin}{location}"))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Http(remote) | Identifier::Https(remote) => {
                // origin() is always Some for network identifiers
                let origin = self.origin().unwrap_or_default();
                write!(f, "{}{}", origin, remote.path)
            }
            Identifier::File { path } => write!(f, "file://{path}"),
            Identifier::Data { payload } => write!(f, "data:,{payload}"),
        }
    }
}

fn parse_remote(rest: &str, default_port: u16) -> Result<Remote, FetchError> {
    let (host_port, path) = match rest.split_once('/') {
        Some((host_port, path)) => (host_port, format!("/{path}")),
        None => (rest, "/".to_string()),
    };

    let (host, port) = match host_port.split_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| FetchError::malformed(format!("invalid port: {port}")))?;
            (host, port)
        }
        None => (host_port, default_port),
    };

    if host.is_empty() {
        return Err(FetchError::malformed("empty host"));
    }

    Ok(Remote {
        host: host.to_string(),
        port,
        path,
    })
}

/// Strips a leading `view-source:` prefix, reporting whether it was present.
pub fn split_view_source(raw: &str) -> (bool, &str) {
    match raw.strip_prefix(VIEW_SOURCE_PREFIX) {
        Some(rest) => (true, rest),
        None => (false, raw),
    }
}
