// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Pseudo-user identity derivation.
//!
//! The id is a content hash of two attacker-controllable beacon fields, so
//! it is explicitly approximate: collisions between distinct clients are
//! expected and accepted, and the same client always hashes to the same id
//! within a UV day window.

use sha2::{Digest, Sha256};

/// Derives the deterministic pseudo-user id for a visit.
pub fn user_id(refer: &str, ua: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(refer.as_bytes());
    hasher.update(ua.as_bytes());
    hex::encode(hasher.finalize())
}
