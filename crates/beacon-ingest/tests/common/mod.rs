// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Shared helpers for integration tests.

/// Renders one nginx-style access-log line carrying a url-encoded beacon,
/// the same shape the load generator produces.
pub fn make_log_line(time: &str, url: &str, refer: &str, ua: &str) -> String {
    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("time", time)
        .append_pair("url", url)
        .append_pair("refer", refer)
        .append_pair("ua", ua)
        .finish();
    format!(
        "127.0.0.1 - - [08/Mar/2018:00:48:34 +0800] \"OPTIONS /dig?{query} HTTP/1.1\" 200 43 \"-\" \"{ua}\" \"-\""
    )
}
