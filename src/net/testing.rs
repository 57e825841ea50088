//! In-memory test doubles: a scripted server reachable through a fake
//! connector, and a clock that only moves when told to.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::errors::FetchError;
use crate::net::cache::Clock;
use crate::net::identifier::ConnectionKey;
use crate::net::transport::{Connector, Transport};

enum Reply {
    Bytes(Vec<u8>),
    /// Peer closes the connection instead of answering
    Hangup,
    /// Peer has reset the connection; the next write fails outright
    Reset,
}

#[derive(Default)]
struct ServerState {
    replies: VecDeque<Reply>,
    connects: Vec<ConnectionKey>,
    requests: Vec<String>,
    closes: usize,
    refuse: bool,
}

/// Answers requests, in order, with scripted replies. Shared by every
/// connection the connector opens.
#[derive(Clone, Default)]
pub(crate) struct MockServer {
    state: Arc<Mutex<ServerState>>,
}

impl MockServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connector(&self) -> MockConnector {
        MockConnector { server: self.clone() }
    }

    /// Queues a raw response.
    pub fn reply(&self, raw: impl Into<Vec<u8>>) -> &Self {
        self.state.lock().unwrap().replies.push_back(Reply::Bytes(raw.into()));
        self
    }

    /// Queues a `200` with a content-length framed body and extra header lines.
    pub fn ok(&self, body: &str, extra_headers: &[&str]) -> &Self {
        self.reply(response(200, extra_headers, body))
    }

    /// Queues a connection close in place of the next response.
    pub fn hangup(&self) -> &Self {
        self.state.lock().unwrap().replies.push_back(Reply::Hangup);
        self
    }

    /// Makes the next request write fail with a broken pipe.
    pub fn reset(&self) -> &Self {
        self.state.lock().unwrap().replies.push_back(Reply::Reset);
        self
    }

    /// Makes every following connect attempt fail.
    pub fn refuse_connections(&self) {
        self.state.lock().unwrap().refuse = true;
    }

    pub fn connects(&self) -> usize {
        self.state.lock().unwrap().connects.len()
    }

    pub fn closes(&self) -> usize {
        self.state.lock().unwrap().closes
    }

    /// Request lines (`GET /path HTTP/1.1`) received so far.
    pub fn request_lines(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .map(|r| r.lines().next().unwrap_or_default().to_string())
            .collect()
    }

    /// Full text of every request received so far.
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }
}

/// Builds a raw response with a content-length framed body.
pub(crate) fn response(status: u16, extra_headers: &[&str], body: &str) -> Vec<u8> {
    let mut raw = format!("HTTP/1.1 {status} Whatever\r\n");
    for header in extra_headers {
        raw.push_str(header);
        raw.push_str("\r\n");
    }
    raw.push_str(&format!("Content-Length: {}\r\n\r\n{}", body.len(), body));
    raw.into_bytes()
}

pub(crate) struct MockConnector {
    server: MockServer,
}

impl Connector for MockConnector {
    fn connect(&mut self, key: &ConnectionKey) -> Result<Box<dyn Transport>, FetchError> {
        let mut state = self.server.state.lock().unwrap();
        if state.refuse {
            return Err(FetchError::Connect {
                origin: format!("{}://{}:{}", key.scheme, key.host, key.port),
                source: io::Error::from(io::ErrorKind::ConnectionRefused),
            });
        }
        state.connects.push(key.clone());

        Ok(Box::new(MockTransport {
            server: self.server.clone(),
            pending: Vec::new(),
            inbox: VecDeque::new(),
            hung_up: false,
        }))
    }
}

struct MockTransport {
    server: MockServer,
    pending: Vec<u8>,
    inbox: VecDeque<u8>,
    hung_up: bool,
}

impl Write for MockTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        {
            let mut state = self.server.state.lock().unwrap();
            if matches!(state.replies.front(), Some(Reply::Reset)) {
                state.replies.pop_front();
                self.hung_up = true;
            }
        }
        if self.hung_up {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        }
        self.pending.extend_from_slice(buf);

        while let Some(end) = self.pending.windows(4).position(|w| w == b"\r\n\r\n") {
            let request: Vec<u8> = self.pending.drain(..end + 4).collect();
            let mut state = self.server.state.lock().unwrap();
            state.requests.push(String::from_utf8_lossy(&request).into_owned());

            match state.replies.pop_front() {
                Some(Reply::Bytes(bytes)) => self.inbox.extend(bytes),
                Some(Reply::Hangup) | Some(Reply::Reset) | None => self.hung_up = true,
            }
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.inbox.len());
        for (slot, byte) in buf.iter_mut().zip(self.inbox.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Transport for MockTransport {
    fn close(&mut self) {
        self.server.state.lock().unwrap().closes += 1;
    }
}

/// Clock that stands still until advanced. Clones share the same time.
#[derive(Clone)]
pub(crate) struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }
}
