//! Proxy Module
//!
//! HTTP/1.0 forwarding relay in front of the object cache.
//!
//! # Flow
//! - Listener accepts a connection and hands it to a fresh worker thread
//! - Worker parses the request and consults the cache before the network
//! - On a miss the origin response is relayed and, if small enough, admitted

pub mod request;
pub mod server;
pub mod worker;

pub use server::ProxyServer;
