// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Page classification for visited URLs.
//!
//! Matching order is significant and follows expected traffic volume:
//! movie detail pages first, then list pages, everything else is the home
//! page.

use tracing::debug;

const MOVIE_MARKER: &str = "/movie/";
const LIST_MARKER: &str = "/list/";
const EXT_MARKER: &str = ".html";

/// Sentinel resource id for the home page. The ordered-set members in the
/// store must be meaningful non-zero ids, so home gets 1.
pub const HOME_RESOURCE_ID: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageType {
    Home,
    List,
    Movie,
}

impl PageType {
    pub fn as_str(self) -> &'static str {
        match self {
            PageType::Home => "home",
            PageType::List => "list",
            PageType::Movie => "movie",
        }
    }
}

impl std::fmt::Display for PageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified page: type plus the resource id taken from the URL path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRef {
    pub page_type: PageType,
    pub resource_id: i64,
}

/// Classifies a URL into a [`PageRef`].
pub fn classify(url: &str) -> PageRef {
    if let Some(pos) = url.find(MOVIE_MARKER) {
        return PageRef {
            page_type: PageType::Movie,
            resource_id: extract_id(url, pos + MOVIE_MARKER.len()),
        };
    }
    if let Some(pos) = url.find(LIST_MARKER) {
        return PageRef {
            page_type: PageType::List,
            resource_id: extract_id(url, pos + LIST_MARKER.len()),
        };
    }
    PageRef {
        page_type: PageType::Home,
        resource_id: HOME_RESOURCE_ID,
    }
}

// The id is the text between the path marker and the ".html" suffix. A
// missing or non-numeric id falls back to 0 rather than rejecting the hit;
// 0 is indistinguishable in storage from a real low-numbered resource, which
// is the documented compatibility trade-off.
fn extract_id(url: &str, start: usize) -> i64 {
    let id_text = url[start..]
        .find(EXT_MARKER)
        .map(|end| &url[start..start + end])
        .unwrap_or("");
    match id_text.parse() {
        Ok(id) => id,
        Err(_) => {
            debug!("non-numeric resource id in url {url:?}, falling back to 0");
            0
        }
    }
}
