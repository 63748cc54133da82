// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Beacon access-log ingestion and page-view / unique-visitor aggregation.
//!
//! The crate tails an append-only nginx access log, extracts the tracking
//! beacon (`/dig?` pixel) query string from each line, classifies the visited
//! page, and maintains PV and approximate UV counters at day, hour, and
//! minute granularity in an external sorted-set store.
//!
//! Stages run as independent tokio tasks connected by bounded mpsc channels;
//! queue capacity is the sole backpressure mechanism. See [`pipeline`] for
//! the wiring and the drain-then-stop shutdown sequence.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod aggregate;
pub mod beacon;
pub mod config;
pub mod error;
pub mod identity;
pub mod page;
pub mod pipeline;
pub mod store;
pub mod tailer;
pub mod visit;
pub mod window;
pub mod worker;
pub mod writer;
