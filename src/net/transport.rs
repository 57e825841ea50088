//! Byte transports underneath the connection pool.
//!
//! The pool never touches sockets directly. It asks a [`Connector`] for a
//! [`Transport`] and from then on only reads, writes and closes it. This keeps
//! the pool and the codec testable against in-memory transports.
//!
//! [`NetConnector`] is the real implementation: plain TCP for `http`, and TCP
//! wrapped in a rustls client session for `https`. Trust anchors come from the
//! platform certificate store, falling back to the bundled webpki roots when the
//! platform store is empty or cannot be read.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};

use crate::errors::FetchError;
use crate::net::identifier::{ConnectionKey, Scheme};

/// An open bidirectional byte channel.
pub trait Transport: Read + Write + Send {
    /// Closes the channel. Errors are not interesting at this point and are ignored.
    fn close(&mut self);
}

/// Opens transports for a connection key.
pub trait Connector: Send {
    fn connect(&mut self, key: &ConnectionKey) -> Result<Box<dyn Transport>, FetchError>;
}

impl Transport for TcpStream {
    fn close(&mut self) {
        let _ = self.shutdown(Shutdown::Both);
    }
}

impl Transport for StreamOwned<ClientConnection, TcpStream> {
    fn close(&mut self) {
        self.conn.send_close_notify();
        let _ = self.flush();
        let _ = self.sock.shutdown(Shutdown::Both);
    }
}

/// Connector for real TCP and TLS connections.
#[derive(Default)]
pub struct NetConnector {
    // Built on the first https connection
    tls: Option<Arc<ClientConfig>>,
}

impl NetConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn tls_config(&mut self) -> Result<Arc<ClientConfig>, rustls::Error> {
        if let Some(config) = &self.tls {
            return Ok(config.clone());
        }

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()?
            .with_root_certificates(root_store())
            .with_no_client_auth();

        let config = Arc::new(config);
        self.tls = Some(config.clone());
        Ok(config)
    }
}

impl Connector for NetConnector {
    fn connect(&mut self, key: &ConnectionKey) -> Result<Box<dyn Transport>, FetchError> {
        let origin = format!("{}://{}:{}", key.scheme, key.host, key.port);

        let mut tcp = TcpStream::connect((key.host.as_str(), key.port)).map_err(|source| {
            FetchError::Connect {
                origin: origin.clone(),
                source,
            }
        })?;

        match key.scheme {
            Scheme::Http => Ok(Box::new(tcp)),
            Scheme::Https => {
                let server_name = ServerName::try_from(key.host.clone())
                    .map_err(|_| FetchError::malformed(format!("invalid TLS server name: {}", key.host)))?;
                let mut session = self
                    .tls_config()
                    .and_then(|config| ClientConnection::new(config, server_name))
                    .map_err(|e| tls_setup_failed(&origin, e))?;

                // Handshake failures belong to connecting, not to the exchange
                while session.is_handshaking() {
                    session.complete_io(&mut tcp).map_err(|source| FetchError::Connect {
                        origin: origin.clone(),
                        source,
                    })?;
                }
                log::debug!("TLS session established with {}", origin);

                Ok(Box::new(StreamOwned::new(session, tcp)))
            }
            Scheme::File | Scheme::Data => Err(FetchError::malformed(format!(
                "{} identifiers have no transport",
                key.scheme
            ))),
        }
    }
}

// Client config or session setup errors are permanent for this origin
fn tls_setup_failed(origin: &str, err: rustls::Error) -> FetchError {
    FetchError::Connect {
        origin: origin.to_string(),
        source: io::Error::new(io::ErrorKind::Other, err),
    }
}

fn root_store() -> RootCertStore {
    let mut roots = RootCertStore::empty();

    let native = rustls_native_certs::load_native_certs();
    for err in &native.errors {
        log::debug!("Skipping platform certificate source: {}", err);
    }
    let (added, ignored) = roots.add_parsable_certificates(native.certs);
    log::debug!("Loaded {} platform certificates ({} ignored)", added, ignored);

    if roots.is_empty() {
        log::debug!("No usable platform certificates, using bundled webpki roots");
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }

    roots
}
