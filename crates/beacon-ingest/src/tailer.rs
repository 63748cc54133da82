// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log tailer: follows an actively-appended access log forever.
//!
//! This is the pipeline's primary backpressure point: when the line queue is
//! full the send blocks, which throttles file reads to the downstream
//! throughput.

use std::path::PathBuf;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::PipelineError;

/// How long to wait at end-of-file before resuming reads.
const IDLE_WAIT: Duration = Duration::from_secs(3);

// Maximum number of consecutive read errors before giving up on the file.
// Backoff formula: 10ms * 2^error_count, capped at MAX to prevent overflow
const MAX_READ_ERRORS: u32 = 5;

pub struct LogTailer {
    path: PathBuf,
    lines: mpsc::Sender<String>,
    cancel: CancellationToken,
    progress_interval: u64,
}

impl LogTailer {
    pub fn new(
        path: PathBuf,
        lines: mpsc::Sender<String>,
        cancel: CancellationToken,
        progress_interval: u64,
    ) -> Self {
        LogTailer {
            path,
            lines,
            cancel,
            progress_interval,
        }
    }

    /// Reads the file line by line, waiting at EOF and resuming from the
    /// current position ("follow" semantics). Exits on cancellation, when
    /// the receiving side goes away, or after too many consecutive read
    /// errors. Dropping the sender on exit closes the line queue and starts
    /// the downstream drain.
    pub async fn run(self) -> Result<(), PipelineError> {
        let file = File::open(&self.path).await?;
        let mut reader = BufReader::new(file);
        let mut buf = String::new();
        let mut count: u64 = 0;
        let mut consecutive_errors: u32 = 0;

        loop {
            buf.clear();
            let read = tokio::select! {
                read = reader.read_line(&mut buf) => read,
                _ = self.cancel.cancelled() => break,
            };
            match read {
                Ok(0) => {
                    consecutive_errors = 0;
                    debug!("reached end of {:?} after {count} lines, waiting", self.path);
                    tokio::select! {
                        _ = sleep(IDLE_WAIT) => {}
                        _ = self.cancel.cancelled() => break,
                    }
                }
                Ok(_) => {
                    // if the writer is mid-append at EOF this can be a
                    // partial line, with the remainder arriving as a second
                    // line after the idle wait
                    consecutive_errors = 0;
                    let line = buf.trim_end_matches(['\r', '\n']).to_string();
                    let sent = tokio::select! {
                        sent = self.lines.send(line) => sent,
                        _ = self.cancel.cancelled() => break,
                    };
                    if sent.is_err() {
                        // all workers gone, nothing left to feed
                        break;
                    }
                    count += 1;
                    if count % self.progress_interval == 0 {
                        info!("tailer read {count} lines");
                    }
                }
                Err(e) => {
                    consecutive_errors += 1;
                    if consecutive_errors >= MAX_READ_ERRORS {
                        error!(
                            "giving up after {consecutive_errors} consecutive read errors: {e}"
                        );
                        return Err(PipelineError::Io(e));
                    }
                    let backoff_ms = 10u64 * (1 << consecutive_errors);
                    warn!("read error on {:?}, retrying in {backoff_ms}ms: {e}", self.path);
                    tokio::select! {
                        _ = sleep(Duration::from_millis(backoff_ms)) => {}
                        _ = self.cancel.cancelled() => break,
                    }
                }
            }
        }
        debug!("tailer stopped after {count} lines");
        Ok(())
    }
}
