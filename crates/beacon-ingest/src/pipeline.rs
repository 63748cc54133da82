// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Pipeline wiring and lifecycle.
//!
//! file -> tailer -> line queue -> worker pool -> {pv queue, uv queue}
//! -> {pv aggregator, uv aggregator} -> storage queue -> storage writer.
//!
//! All queues are bounded; a slow stage fills its input queue and blocks the
//! upstream send, ultimately throttling file reads. Shutdown cancels only
//! the tailer: every other stage exits when its input queue closes and
//! closes its own outputs by dropping the senders, so in-flight work drains
//! deterministically.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::aggregate::{PvAggregator, UvAggregator};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::store::CounterStore;
use crate::tailer::LogTailer;
use crate::worker::EventWorker;
use crate::writer::StorageWriter;

/// Handle to a running pipeline. Owns the cancellation token and every
/// stage task.
pub struct Pipeline {
    cancel: CancellationToken,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Pipeline {
    /// Validates the config, probes store connectivity (fatal on failure),
    /// and spawns every stage. The store handle is the only shared resource;
    /// it is passed at construction, never held in global state.
    pub async fn start(
        config: PipelineConfig,
        store: Arc<dyn CounterStore>,
    ) -> Result<Pipeline, PipelineError> {
        config.validate()?;
        store.ping().await?;

        let cancel = CancellationToken::new();
        let (line_tx, line_rx) = mpsc::channel(config.line_queue_capacity());
        let (pv_tx, pv_rx) = mpsc::channel(config.stage_queue_capacity());
        let (uv_tx, uv_rx) = mpsc::channel(config.stage_queue_capacity());
        let (req_tx, req_rx) = mpsc::channel(config.stage_queue_capacity());

        let mut tasks: Vec<(&'static str, JoinHandle<()>)> = Vec::new();

        let tailer = LogTailer::new(
            config.access_log.clone(),
            line_tx,
            cancel.clone(),
            config.progress_interval(),
        );
        tasks.push((
            "tailer",
            tokio::spawn(async move {
                if let Err(e) = tailer.run().await {
                    error!("log tailer stopped with error: {e}");
                }
            }),
        ));

        let line_rx = Arc::new(Mutex::new(line_rx));
        for _ in 0..config.workers {
            let worker = EventWorker::new(Arc::clone(&line_rx), pv_tx.clone(), uv_tx.clone());
            tasks.push(("event-worker", tokio::spawn(worker.run())));
        }
        // workers hold the only senders from here on
        drop(pv_tx);
        drop(uv_tx);

        tasks.push((
            "pv-aggregator",
            tokio::spawn(PvAggregator::new(pv_rx, req_tx.clone()).run()),
        ));
        tasks.push((
            "uv-aggregator",
            tokio::spawn(UvAggregator::new(uv_rx, req_tx, Arc::clone(&store)).run()),
        ));
        tasks.push(("storage-writer", tokio::spawn(StorageWriter::new(req_rx, store).run())));

        info!(
            "pipeline started: tailing {:?} with {} workers",
            config.access_log, config.workers
        );
        Ok(Pipeline { cancel, tasks })
    }

    /// Cancels the tailer and waits for every stage to drain and stop.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for (name, task) in self.tasks {
            if let Err(e) = task.await {
                error!("{name} task failed: {e}");
            }
        }
        info!("pipeline drained and stopped");
    }
}
