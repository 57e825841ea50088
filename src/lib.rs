//! Retrieval layer of the Gosub toy browser.
//!
//! Resolves `http`, `https`, `file` and `data` identifiers to a status, headers
//! and a decoded body. Network fetches reuse one connection per origin, honour
//! `Cache-Control` for repeated requests, retry once when a pooled connection
//! turns out to be dead, and follow redirects up to a fixed limit.
//!
//! ```rust
//! use gosub_fetch::{FetchConfig, FetchEngine};
//!
//! let mut engine = FetchEngine::new(FetchConfig::default());
//! let body = engine.load("data:,hello").unwrap();
//! assert_eq!(body, "hello");
//! ```

pub mod config;
pub mod errors;
pub mod net;

pub use config::FetchConfig;
pub use errors::FetchError;
pub use net::FetchEngine;
