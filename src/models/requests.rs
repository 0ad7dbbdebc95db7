//! Request DTOs for the admin API
//!
//! Defines the query parameters accepted by admin endpoints.

use serde::Deserialize;

/// Query for the evict operation (DELETE /entries)
///
/// # Fields
/// - `bytes`: Bytes to reclaim from the LRU end; omitted means everything
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvictRequest {
    /// Bytes to reclaim
    #[serde(default)]
    pub bytes: Option<usize>,
}

impl EvictRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.bytes == Some(0) {
            return Some("bytes must be greater than zero".to_string());
        }
        None
    }
}
