//! Per-origin connection reuse.
//!
//! The pool keeps at most one live [`Connection`] per [`ConnectionKey`]. A
//! connection stays in the pool until it is explicitly released; there is no
//! health check, so a connection the peer has closed is only noticed when the
//! next exchange on it fails.

use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Write};

use crate::errors::FetchError;
use crate::net::identifier::ConnectionKey;
use crate::net::transport::{Connector, Transport};

/// A transport plus the buffered reader responses are parsed from.
pub struct Connection {
    reader: BufReader<Box<dyn Transport>>,
}

impl Connection {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            reader: BufReader::new(transport),
        }
    }

    /// Writes the whole request and flushes it.
    pub fn send(&mut self, request: &[u8]) -> io::Result<()> {
        let transport = self.reader.get_mut();
        transport.write_all(request)?;
        transport.flush()
    }

    pub fn reader(&mut self) -> &mut impl BufRead {
        &mut self.reader
    }

    fn close(mut self) {
        self.reader.get_mut().close();
    }
}

pub struct ConnectionPool {
    connector: Box<dyn Connector>,
    connections: HashMap<ConnectionKey, Connection>,
}

impl ConnectionPool {
    pub fn new(connector: Box<dyn Connector>) -> Self {
        Self {
            connector,
            connections: HashMap::new(),
        }
    }

    /// Returns the live connection for `key`, opening one if there is none.
    pub fn acquire(&mut self, key: &ConnectionKey) -> Result<&mut Connection, FetchError> {
        use std::collections::hash_map::Entry;

        match self.connections.entry(key.clone()) {
            Entry::Occupied(o) => Ok(o.into_mut()),
            Entry::Vacant(v) => {
                log::debug!("Opening connection to {}://{}:{}", key.scheme, key.host, key.port);
                let transport = self.connector.connect(key)?;
                Ok(v.insert(Connection::new(transport)))
            }
        }
    }

    /// Closes and forgets the connection for `key`. Does nothing when there is none.
    pub fn release(&mut self, key: &ConnectionKey) {
        if let Some(conn) = self.connections.remove(key) {
            log::debug!("Closing connection to {}://{}:{}", key.scheme, key.host, key.port);
            conn.close();
        }
    }

    pub fn release_all(&mut self) {
        for (_, conn) in self.connections.drain() {
            conn.close();
        }
    }

    pub fn contains(&self, key: &ConnectionKey) -> bool {
        self.connections.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Drop for ConnectionPool {
    fn drop(&mut self) {
        self.release_all();
    }
}
