//! API Module
//!
//! HTTP handlers and routing for the admin API.
//!
//! # Endpoints
//! - `GET /stats` - Cache statistics
//! - `GET /entries` - List cached objects
//! - `DELETE /entries` - Evict cached objects
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
