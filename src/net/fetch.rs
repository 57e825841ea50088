use crate::config::FetchConfig;
use crate::errors::FetchError;
use crate::net::cache::ResponseCache;
use crate::net::codec;
use crate::net::identifier::{split_view_source, Identifier, Remote};
use crate::net::pool::{Connection, ConnectionPool};
use crate::net::response::{Page, Response};
use crate::net::retry::is_transient;
use crate::net::transport::{Connector, NetConnector};
use http::header::{CONNECTION, LOCATION};
use std::path::PathBuf;

/// Retrieval engine: resolves identifiers to responses, reusing connections and
/// cached responses across calls.
///
/// The engine is meant for one caller at a time. All I/O is blocking and there
/// are no timeouts beyond what the OS socket layer imposes.
pub struct FetchEngine {
    config: FetchConfig,            // Limits and identity
    pool: ConnectionPool,           // Live connections per origin
    cache: ResponseCache,           // Cached 200 responses per resource
}

impl FetchEngine {
    // Creates an engine that talks to the real network and caches in memory
    pub fn new(config: FetchConfig) -> Self {
        Self::with_parts(config, Box::new(NetConnector::new()), ResponseCache::default())
    }

    // Creates an engine from explicit parts, so tests can swap transport and cache
    pub fn with_parts(config: FetchConfig, connector: Box<dyn Connector>, cache: ResponseCache) -> Self {
        Self {
            config,
            pool: ConnectionPool::new(connector),
            cache,
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Fetches a single resource. Redirects are returned as-is.
    pub fn fetch(&mut self, id: &Identifier) -> Result<Response, FetchError> {
        match id {
            Identifier::Data { payload } => Ok(Response::local(payload.clone())),
            Identifier::File { path } => self.fetch_file(path),
            Identifier::Http(remote) | Identifier::Https(remote) => self.fetch_remote(id, remote),
        }
    }

    /// Loads `raw`, following redirects, and returns the body of the final response.
    pub fn load(&mut self, raw: &str) -> Result<String, FetchError> {
        let (_, response) = self.follow(Identifier::parse(raw)?)?;
        Ok(response.body)
    }

    /// Like [`load`](Self::load), but also understands a `view-source:` prefix.
    pub fn navigate(&mut self, raw: &str) -> Result<Page, FetchError> {
        let (view_source, raw) = split_view_source(raw);
        let (id, response) = self.follow(Identifier::parse(raw)?)?;

        Ok(Page {
            url: id.to_string(),
            body: response.body,
            view_source,
        })
    }

    /// Closes every pooled connection. Cached responses are kept.
    pub fn close_all(&mut self) {
        self.pool.release_all();
    }

    fn follow(&mut self, mut id: Identifier) -> Result<(Identifier, Response), FetchError> {
        let mut redirects = 0;

        loop {
            let response = self.fetch(&id)?;
            if !response.is_redirect() {
                return Ok((id, response));
            }

            if redirects >= self.config.max_redirects {
                return Err(FetchError::TooManyRedirects(self.config.max_redirects));
            }

            let location = response
                .headers
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or(FetchError::MissingRedirectTarget { status: response.status })?;

            let next = id.resolve(location)?;
            log::info!("Redirect {} from {} to {}", response.status, id, next);

            id = Identifier::parse(&next)?;
            redirects += 1;
        }
    }

    fn fetch_file(&self, path: &str) -> Result<Response, FetchError> {
        if !self.config.file_access {
            return Err(FetchError::FileAccessDisabled(path.to_string()));
        }

        let bytes = std::fs::read(path).map_err(|source| FetchError::ResourceUnavailable {
            path: PathBuf::from(path),
            source,
        })?;
        let body = String::from_utf8(bytes).map_err(|e| FetchError::DecodeError(e.to_string()))?;

        Ok(Response::local(body))
    }

    fn fetch_remote(&mut self, id: &Identifier, remote: &Remote) -> Result<Response, FetchError> {
        // Network identifiers always have keys
        let (Some(conn_key), Some(cache_key)) = (id.connection_key(), id.cache_key()) else {
            return Err(FetchError::malformed(format!("{id} is not a network identifier")));
        };

        if let Some(cached) = self.cache.read(&cache_key) {
            log::debug!("Cache hit for {}", id);
            return Ok(cached);
        }
        log::debug!("Cache miss for {}", id);

        let request = codec::build_request(remote, &self.config.user_agent);
        let mut last_error = None;

        for attempt in 1..=self.config.max_attempts {
            let conn = self.pool.acquire(&conn_key)?;

            match exchange(conn, &request) {
                Ok(response) => {
                    if wants_close(&response) {
                        self.pool.release(&conn_key);
                    }
                    self.cache.write(cache_key, &response);
                    return Ok(response);
                }
                Err(e) if is_transient(&e) => {
                    log::warn!("Attempt {} for {} failed: {}", attempt, id, e);
                    self.pool.release(&conn_key);
                    last_error = Some(e);
                }
                Err(e) => {
                    // Framing is lost, the connection cannot be reused
                    self.pool.release(&conn_key);
                    return Err(e);
                }
            }
        }

        Err(FetchError::RequestFailed {
            attempts: self.config.max_attempts,
            source: Box::new(last_error.unwrap_or(FetchError::ConnectionClosed)),
        })
    }
}

// One request/response round trip on an open connection
fn exchange(conn: &mut Connection, request: &[u8]) -> Result<Response, FetchError> {
    conn.send(request)?;

    let reader = conn.reader();
    let status = codec::read_status(reader)?;
    let headers = codec::read_headers(reader)?;
    let raw = codec::read_body(reader, &headers)?;
    let body = codec::decode_body(raw, &headers)?;

    Ok(Response { status, headers, body })
}

fn wants_close(response: &Response) -> bool {
    response
        .headers
        .get(CONNECTION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("close"))
}
