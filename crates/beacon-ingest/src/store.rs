// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The counter store seam.
//!
//! The pipeline only ever talks to the key-value store through
//! [`CounterStore`]: atomic increment-by-member on ordered sets, plus an
//! approximate-distinct admission primitive with explicit window expiry.
//! [`RedisStore`] is the production backend; [`MemoryStore`] is an exact
//! in-process double for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use crate::error::StoreError;

#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Startup connectivity probe. The only store failure that is fatal to
    /// the process, and only at startup.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Atomically increments `member`'s score by one in the ordered set
    /// named `key`. Must be a read-modify-write on the store side so counts
    /// stay correct under any writer interleaving.
    async fn sorted_incr(&self, key: &str, member: i64) -> Result<(), StoreError>;

    /// Admits `value` into the approximate-distinct set `key`. Returns
    /// `true` iff the value was not already present in the window.
    async fn distinct_add(&self, key: &str, value: &str) -> Result<bool, StoreError>;

    /// Sets the time-to-live of `key`. Used to expire UV day windows.
    async fn expire(&self, key: &str, ttl_secs: i64) -> Result<(), StoreError>;
}

/// Redis-backed store: ZINCRBY / PFADD / EXPIRE over a managed multiplexed
/// connection. The manager reconnects on its own and clones cheaply, so each
/// operation checks out its own handle.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(RedisStore { conn })
    }
}

#[async_trait]
impl CounterStore for RedisStore {
    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn sorted_incr(&self, key: &str, member: i64) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: f64 = redis::cmd("ZINCRBY")
            .arg(key)
            .arg(1)
            .arg(member)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn distinct_add(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        // PFADD returns 1 when the HyperLogLog's cardinality estimate changed
        let added: i64 = redis::cmd("PFADD")
            .arg(key)
            .arg(value)
            .query_async(&mut conn)
            .await?;
        Ok(added == 1)
    }

    async fn expire(&self, key: &str, ttl_secs: i64) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: i64 = redis::cmd("EXPIRE")
            .arg(key)
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }
}

/// In-memory store used by unit and integration tests. Distinct sets are
/// exact rather than probabilistic, which only makes test assertions
/// stricter. TTLs are recorded, never enforced, so tests can assert that
/// the UV day-window expiry actually lands.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    sorted: HashMap<String, HashMap<i64, f64>>,
    distinct: HashMap<String, HashSet<String>>,
    ttls: HashMap<String, i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current score of `member` in the set `key`, if any.
    pub fn sorted_score(&self, key: &str, member: i64) -> Option<f64> {
        self.lock()
            .sorted
            .get(key)
            .and_then(|set| set.get(&member))
            .copied()
    }

    /// Number of members admitted to the distinct set `key`.
    pub fn distinct_len(&self, key: &str) -> usize {
        self.lock().distinct.get(key).map_or(0, HashSet::len)
    }

    /// Last TTL recorded for `key`.
    pub fn ttl(&self, key: &str) -> Option<i64> {
        self.lock().ttls.get(key).copied()
    }

    #[allow(clippy::expect_used)]
    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().expect("memory store lock poisoned")
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn sorted_incr(&self, key: &str, member: i64) -> Result<(), StoreError> {
        let mut state = self.lock();
        *state
            .sorted
            .entry(key.to_string())
            .or_default()
            .entry(member)
            .or_insert(0.0) += 1.0;
        Ok(())
    }

    async fn distinct_add(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let mut state = self.lock();
        Ok(state
            .distinct
            .entry(key.to_string())
            .or_default()
            .insert(value.to_string()))
    }

    async fn expire(&self, key: &str, ttl_secs: i64) -> Result<(), StoreError> {
        self.lock().ttls.insert(key.to_string(), ttl_secs);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_sorted_incr_accumulates() {
        let store = MemoryStore::new();
        store.sorted_incr("pv_day_0", 7).await.unwrap();
        store.sorted_incr("pv_day_0", 7).await.unwrap();
        store.sorted_incr("pv_day_0", 8).await.unwrap();

        assert_eq!(store.sorted_score("pv_day_0", 7), Some(2.0));
        assert_eq!(store.sorted_score("pv_day_0", 8), Some(1.0));
        assert_eq!(store.sorted_score("pv_day_0", 9), None);
        assert_eq!(store.sorted_score("pv_hour_0", 7), None);
    }

    #[tokio::test]
    async fn test_memory_distinct_add_dedups_per_key() {
        let store = MemoryStore::new();
        assert!(store.distinct_add("uv_hpll_1", "abc").await.unwrap());
        assert!(!store.distinct_add("uv_hpll_1", "abc").await.unwrap());
        // a different window admits the same value again
        assert!(store.distinct_add("uv_hpll_2", "abc").await.unwrap());
        assert_eq!(store.distinct_len("uv_hpll_1"), 1);
    }

    #[tokio::test]
    async fn test_memory_records_ttl() {
        let store = MemoryStore::new();
        assert_eq!(store.ttl("uv_hpll_1"), None);
        store.expire("uv_hpll_1", 86_400).await.unwrap();
        assert_eq!(store.ttl("uv_hpll_1"), Some(86_400));
    }
}
