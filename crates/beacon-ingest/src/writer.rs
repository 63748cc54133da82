// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Storage writer: applies increment requests to the windowed keys.
//!
//! Each request fans out to six keys; the writes are independent, so a
//! failed key is logged and skipped while its siblings still land. Partial
//! application under failure is accepted semantics, as is losing the
//! request entirely during a store outage.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::store::CounterStore;
use crate::visit::IncrementRequest;
use crate::window;

pub struct StorageWriter {
    requests: mpsc::Receiver<IncrementRequest>,
    store: Arc<dyn CounterStore>,
}

impl StorageWriter {
    pub fn new(requests: mpsc::Receiver<IncrementRequest>, store: Arc<dyn CounterStore>) -> Self {
        StorageWriter { requests, store }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            let member = request.page.resource_id;
            for key in window::storage_keys(request.kind, &request.page, &request.timestamp) {
                if let Err(e) = self.store.sorted_incr(&key, member).await {
                    // high-volume path: log the failure and move on
                    error!("increment failed for {key} member {member}: {e}");
                }
            }
        }
        debug!("storage writer stopped");
    }
}
