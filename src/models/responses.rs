//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{CacheStats, EntryInfo};

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of objects admitted
    pub admissions: u64,
    /// Number of objects refused admission
    pub rejections: u64,
    /// Number of evictions
    pub evictions: u64,
    /// Bytes reclaimed by eviction
    pub evicted_bytes: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Current cached bytes
    pub total_size: usize,
    /// Byte budget
    pub capacity: usize,
    /// Largest cacheable object
    pub per_object_limit: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            admissions: stats.admissions,
            rejections: stats.rejections,
            evictions: stats.evictions,
            evicted_bytes: stats.evicted_bytes,
            total_entries: stats.total_entries,
            total_size: stats.total_size,
            capacity: stats.capacity,
            per_object_limit: stats.per_object_limit,
        }
    }
}

/// One cached object as listed by GET /entries
#[derive(Debug, Clone, Serialize)]
pub struct EntryResponse {
    /// Request URI the object is cached under
    pub key: String,
    /// Payload size in bytes
    pub size: usize,
    /// Threads currently streaming the payload
    pub readers: usize,
}

impl From<EntryInfo> for EntryResponse {
    fn from(info: EntryInfo) -> Self {
        Self {
            key: info.key,
            size: info.size,
            readers: info.readers,
        }
    }
}

/// Response body for GET /entries, most recently used first
#[derive(Debug, Clone, Serialize)]
pub struct EntriesResponse {
    pub entries: Vec<EntryResponse>,
    pub total_size: usize,
}

impl EntriesResponse {
    pub fn new(entries: Vec<EntryInfo>) -> Self {
        let total_size = entries.iter().map(|e| e.size).sum();
        Self {
            entries: entries.into_iter().map(EntryResponse::from).collect(),
            total_size,
        }
    }
}

/// Response body for DELETE /entries
#[derive(Debug, Clone, Serialize)]
pub struct EvictResponse {
    /// Success message
    pub message: String,
    /// Bytes actually reclaimed
    pub freed: usize,
}

impl EvictResponse {
    pub fn new(freed: usize) -> Self {
        Self {
            message: format!("Evicted {} bytes", freed),
            freed,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_response_from_cache_stats() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            total_size: 512,
            capacity: 1024,
            ..CacheStats::default()
        };
        let resp = StatsResponse::from(stats);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
        assert_eq!(resp.total_size, 512);
        assert_eq!(resp.capacity, 1024);
    }

    #[test]
    fn test_stats_response_zero_requests() {
        let resp = StatsResponse::from(CacheStats::default());
        assert_eq!(resp.hit_rate, 0.0);
    }

    #[test]
    fn test_entries_response_totals() {
        let resp = EntriesResponse::new(vec![
            EntryInfo {
                key: "http://a/".to_string(),
                size: 10,
                readers: 0,
            },
            EntryInfo {
                key: "http://b/".to_string(),
                size: 32,
                readers: 1,
            },
        ]);
        assert_eq!(resp.total_size, 42);
        assert_eq!(resp.entries[1].readers, 1);

        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("http://a/"));
    }

    #[test]
    fn test_evict_response_serialize() {
        let json = serde_json::to_string(&EvictResponse::new(128)).unwrap();
        assert!(json.contains("128"));
        assert!(json.contains("Evicted"));
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}
