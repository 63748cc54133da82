// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Value records passed between pipeline stages. None of these persist
//! beyond one pipeline traversal; only the store's sorted sets outlive the
//! process.

use crate::beacon::BeaconEvent;
use crate::page::PageRef;

/// One fully parsed visit, fanned out to both the PV and UV queues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitRecord {
    pub event: BeaconEvent,
    pub user_id: String,
    pub page: PageRef,
}

/// Which counter family an increment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    Pv,
    Uv,
}

impl CounterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CounterKind::Pv => "pv",
            CounterKind::Uv => "uv",
        }
    }
}

impl std::fmt::Display for CounterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An aggregator's instruction to the storage writer: increment the page's
/// resource id by one in every windowed key derived from the timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncrementRequest {
    pub kind: CounterKind,
    pub page: PageRef,
    pub timestamp: String,
}
