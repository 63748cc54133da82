// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use crate::error::PipelineError;

/// Configuration for the ingestion pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Access log file to tail.
    pub access_log: PathBuf,
    /// Number of event worker tasks sharing the line queue.
    pub workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            access_log: PathBuf::from("./dig.log"),
            workers: 5,
        }
    }
}

impl PipelineConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.workers == 0 {
            return Err(PipelineError::InvalidConfig(
                "worker count must be greater than 0".to_string(),
            ));
        }
        if self.access_log.as_os_str().is_empty() {
            return Err(PipelineError::InvalidConfig(
                "access log path cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Line reads outpace per-line processing, so the line queue gets extra
    /// headroom over the per-stage queues.
    pub fn line_queue_capacity(&self) -> usize {
        3 * self.workers
    }

    pub fn stage_queue_capacity(&self) -> usize {
        self.workers
    }

    /// How often the tailer logs reading progress, in lines.
    pub fn progress_interval(&self) -> u64 {
        1_000 * self.workers as u64
    }
}
