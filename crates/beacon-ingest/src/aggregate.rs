// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! PV and UV aggregation stages.
//!
//! Both are single dedicated tasks feeding the shared storage-request
//! queue. PV counts every visit; UV admits each pseudo-user id at most once
//! per day window through the store's approximate-distinct primitive.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::store::CounterStore;
use crate::visit::{CounterKind, IncrementRequest, VisitRecord};
use crate::window;

/// Lifetime of a UV day window. Set explicitly after admission; the window
/// key itself is day-bucketed, so the TTL only garbage-collects stale sets.
pub const DAY_WINDOW_TTL_SECS: i64 = 86_400;

pub struct PvAggregator {
    visits: mpsc::Receiver<VisitRecord>,
    requests: mpsc::Sender<IncrementRequest>,
}

impl PvAggregator {
    pub fn new(
        visits: mpsc::Receiver<VisitRecord>,
        requests: mpsc::Sender<IncrementRequest>,
    ) -> Self {
        PvAggregator { visits, requests }
    }

    /// Emits one increment request per visit, unconditionally.
    pub async fn run(mut self) {
        while let Some(visit) = self.visits.recv().await {
            let request = IncrementRequest {
                kind: CounterKind::Pv,
                page: visit.page,
                timestamp: visit.event.time,
            };
            if self.requests.send(request).await.is_err() {
                break;
            }
        }
        debug!("pv aggregator stopped");
    }
}

pub struct UvAggregator {
    visits: mpsc::Receiver<VisitRecord>,
    requests: mpsc::Sender<IncrementRequest>,
    store: Arc<dyn CounterStore>,
}

impl UvAggregator {
    pub fn new(
        visits: mpsc::Receiver<VisitRecord>,
        requests: mpsc::Sender<IncrementRequest>,
        store: Arc<dyn CounterStore>,
    ) -> Self {
        UvAggregator {
            visits,
            requests,
            store,
        }
    }

    /// Emits an increment request only for the first occurrence of a user id
    /// within its day window. Admission failures drop the record: UV
    /// undercounts during store outages are accepted, never retried.
    pub async fn run(mut self) {
        while let Some(visit) = self.visits.recv().await {
            let key = window::distinct_day_key(&visit.event.time);
            let added = match self.store.distinct_add(&key, &visit.user_id).await {
                Ok(added) => added,
                Err(e) => {
                    warn!("uv admission failed for {key}: {e}");
                    continue;
                }
            };
            if !added {
                continue;
            }
            if let Err(e) = self.store.expire(&key, DAY_WINDOW_TTL_SECS).await {
                warn!("failed to set expiry on {key}: {e}");
            }
            let request = IncrementRequest {
                kind: CounterKind::Uv,
                page: visit.page,
                timestamp: visit.event.time,
            };
            if self.requests.send(request).await.is_err() {
                break;
            }
        }
        debug!("uv aggregator stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beacon::BeaconEvent;
    use crate::error::StoreError;
    use crate::page::{PageRef, PageType};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use tracing_test::traced_test;

    fn visit(time: &str, user_id: &str) -> VisitRecord {
        VisitRecord {
            event: BeaconEvent {
                time: time.to_string(),
                url: "/movie/42.html".to_string(),
                refer: String::new(),
                ua: String::new(),
            },
            user_id: user_id.to_string(),
            page: PageRef {
                page_type: PageType::Movie,
                resource_id: 42,
            },
        }
    }

    #[tokio::test]
    async fn test_pv_counts_every_visit() {
        let (visit_tx, visit_rx) = mpsc::channel(8);
        let (req_tx, mut req_rx) = mpsc::channel(8);
        let task = tokio::spawn(PvAggregator::new(visit_rx, req_tx).run());

        for _ in 0..3 {
            visit_tx
                .send(visit("2018-03-08 00:48:34", "user-a"))
                .await
                .unwrap();
        }
        drop(visit_tx);

        let mut requests = Vec::new();
        while let Some(request) = req_rx.recv().await {
            requests.push(request);
        }
        task.await.unwrap();

        // no dedup: three identical visits yield three requests
        assert_eq!(requests.len(), 3);
        assert!(requests.iter().all(|r| r.kind == CounterKind::Pv));
        assert!(requests.iter().all(|r| r.page.resource_id == 42));
    }

    #[tokio::test]
    async fn test_uv_dedups_within_day_window() {
        let store = Arc::new(MemoryStore::new());
        let (visit_tx, visit_rx) = mpsc::channel(8);
        let (req_tx, mut req_rx) = mpsc::channel(8);
        let task = tokio::spawn(UvAggregator::new(visit_rx, req_tx, Arc::clone(&store) as _).run());

        // same user twice on the same day, once the next day
        visit_tx
            .send(visit("2018-03-08 00:48:34", "user-a"))
            .await
            .unwrap();
        visit_tx
            .send(visit("2018-03-08 09:00:00", "user-a"))
            .await
            .unwrap();
        visit_tx
            .send(visit("2018-03-09 00:00:01", "user-a"))
            .await
            .unwrap();
        drop(visit_tx);

        let mut requests = Vec::new();
        while let Some(request) = req_rx.recv().await {
            requests.push(request);
        }
        task.await.unwrap();

        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.kind == CounterKind::Uv));
        assert_eq!(store.distinct_len("uv_hpll_1520467200"), 1);
        assert_eq!(store.distinct_len("uv_hpll_1520553600"), 1);
    }

    #[tokio::test]
    async fn test_uv_sets_day_window_expiry() {
        let store = Arc::new(MemoryStore::new());
        let (visit_tx, visit_rx) = mpsc::channel(8);
        let (req_tx, mut req_rx) = mpsc::channel(8);
        let task = tokio::spawn(UvAggregator::new(visit_rx, req_tx, Arc::clone(&store) as _).run());

        visit_tx
            .send(visit("2018-03-08 00:48:34", "user-a"))
            .await
            .unwrap();
        drop(visit_tx);

        assert!(req_rx.recv().await.is_some());
        task.await.unwrap();
        assert_eq!(store.ttl("uv_hpll_1520467200"), Some(DAY_WINDOW_TTL_SECS));
    }

    struct FailingStore;

    #[async_trait]
    impl CounterStore for FailingStore {
        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
        async fn sorted_incr(&self, _key: &str, _member: i64) -> Result<(), StoreError> {
            Err(StoreError::Backend("down".to_string()))
        }
        async fn distinct_add(&self, _key: &str, _value: &str) -> Result<bool, StoreError> {
            Err(StoreError::Backend("down".to_string()))
        }
        async fn expire(&self, _key: &str, _ttl_secs: i64) -> Result<(), StoreError> {
            Err(StoreError::Backend("down".to_string()))
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn test_uv_drops_records_on_store_errors() {
        let (visit_tx, visit_rx) = mpsc::channel(8);
        let (req_tx, mut req_rx) = mpsc::channel(8);
        let task = tokio::spawn(UvAggregator::new(visit_rx, req_tx, Arc::new(FailingStore)).run());

        visit_tx
            .send(visit("2018-03-08 00:48:34", "user-a"))
            .await
            .unwrap();
        drop(visit_tx);

        // the record is dropped, not retried, and the stage keeps running
        assert!(req_rx.recv().await.is_none());
        task.await.unwrap();
        assert!(logs_contain("uv admission failed"));
    }
}
