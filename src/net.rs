//! Network layer: identifiers, transports, the connection pool, the HTTP codec,
//! the response cache and the engine that ties them together.

mod cache;
mod codec;
mod fetch;
mod identifier;
mod pool;
mod response;
mod retry;
mod transport;

#[cfg(test)]
mod testing;

pub use cache::{CacheEntry, CachePolicy, CacheStore, Clock, InMemoryCacheStore, ResponseCache, SystemClock};
pub use codec::{build_request, decode_body, read_body, read_headers, read_status};
pub use fetch::FetchEngine;
pub use identifier::{split_view_source, CacheKey, ConnectionKey, Identifier, Remote, Scheme};
pub use pool::{Connection, ConnectionPool};
pub use response::{Page, Response};
pub use retry::is_transient;
pub use transport::{Connector, NetConnector, Transport};
