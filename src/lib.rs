//! Web Cache Proxy - A multithreaded HTTP forwarding proxy
//!
//! Relays client GET requests to origin servers and keeps small responses in
//! a concurrent, size-bounded LRU cache shared by all worker threads.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod proxy;

pub use api::AppState;
pub use cache::CacheStore;
pub use config::Config;
pub use proxy::ProxyServer;
