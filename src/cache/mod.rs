//! Cache module for provider responses
//!
//! This module provides an in-memory cache with a configurable TTL
//! (time-to-live). Expired entries are never served: a stale entry is evicted
//! on read and reported as a miss, so callers always refetch rather than
//! degrade to old data.

mod ttl;

pub use ttl::{CacheStats, TtlCache, MIN_CACHE_DURATION};
