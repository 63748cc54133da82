// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Event workers: the horizontally-scaled stage of the pipeline.
//!
//! N workers share one line queue; each consumed line runs beacon
//! extraction, identity derivation, and page classification, and the
//! resulting [`VisitRecord`] is duplicated to both the PV and UV queues.
//! Lines are dequeued in arbitrary order across workers, so downstream
//! arrival order does not match log order.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, trace};

use crate::visit::VisitRecord;
use crate::{beacon, identity, page};

pub type SharedLineQueue = Arc<Mutex<mpsc::Receiver<String>>>;

pub struct EventWorker {
    lines: SharedLineQueue,
    pv: mpsc::Sender<VisitRecord>,
    uv: mpsc::Sender<VisitRecord>,
}

impl EventWorker {
    pub fn new(
        lines: SharedLineQueue,
        pv: mpsc::Sender<VisitRecord>,
        uv: mpsc::Sender<VisitRecord>,
    ) -> Self {
        EventWorker { lines, pv, uv }
    }

    /// Consumes lines until the queue closes, then drops the downstream
    /// senders so the aggregators drain in turn.
    pub async fn run(self) {
        loop {
            // hold the lock only for the dequeue so peers can interleave
            let line = {
                let mut lines = self.lines.lock().await;
                lines.recv().await
            };
            let Some(line) = line else {
                break;
            };
            let record = process_line(&line);
            if self.pv.send(record.clone()).await.is_err() {
                break;
            }
            if self.uv.send(record).await.is_err() {
                break;
            }
        }
        trace!("event worker stopped");
    }
}

/// Runs the pure per-line transforms: beacon -> identity -> page.
pub fn process_line(line: &str) -> VisitRecord {
    let extraction = beacon::extract(line);
    if extraction.is_degraded() {
        debug!("no beacon in line, counting degraded hit");
    }
    let event = extraction.into_event();
    let user_id = identity::user_id(&event.refer, &event.ua);
    let page = page::classify(&event.url);
    VisitRecord {
        event,
        user_id,
        page,
    }
}
