// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Synthetic access-log generator for testing and load generation.
//!
//! Appends nginx-style log lines carrying url-encoded `/dig?` beacons to a
//! file, drawing urls, referrers, and user agents at random from a fixed
//! universe that matches what the ingestion pipeline classifies.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use rand::seq::SliceRandom;

const UA_LIST: &[&str] = &[
    "Mozilla/5.0 (Macintosh; U; Intel Mac OS X 10_6_8; en-us) AppleWebKit/534.50 (KHTML, like Gecko) Version/5.1 Safari/534.50",
    "Mozilla/5.0 (Windows; U; Windows NT 6.1; en-us) AppleWebKit/534.50 (KHTML, like Gecko) Version/5.1 Safari/534.50",
    "Mozilla/5.0 (compatible; MSIE 9.0; Windows NT 6.1; Trident/5.0;",
    "Mozilla/4.0 (compatible; MSIE 8.0; Windows NT 6.0; Trident/4.0)",
    "Mozilla/4.0 (compatible; MSIE 7.0; Windows NT 6.0)",
    "Mozilla/4.0 (compatible; MSIE 6.0; Windows NT 5.1)",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.6; rv:2.0.1) Gecko/20100101 Firefox/4.0.1",
    "Mozilla/5.0 (Windows NT 6.1; rv:2.0.1) Gecko/20100101 Firefox/4.0.1",
    "Opera/9.80 (Macintosh; Intel Mac OS X 10.6.8; U; en) Presto/2.8.131 Version/11.11",
    "Opera/9.80 (Windows NT 6.1; U; en) Presto/2.8.131 Version/11.11",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_7_0) AppleWebKit/535.11 (KHTML, like Gecko) Chrome/17.0.963.56 Safari/535.11",
    "Mozilla/4.0 (compatible; MSIE 7.0; Windows NT 5.1; Maxthon 2.0)",
    "Mozilla/4.0 (compatible; MSIE 7.0; Windows NT 5.1; TencentTraveler 4.0)",
];

const LIST_IDS: std::ops::Range<u32> = 1..21;
const MOVIE_IDS: std::ops::Range<u32> = 0..12_924;

/// Generates synthetic beacon access-log lines.
#[derive(Parser, Debug)]
#[command(name = "beacon-loadgen", version)]
struct Cli {
    /// Number of log lines to append
    #[arg(long, default_value_t = 10_000)]
    total: usize,

    /// Log file to append to
    #[arg(long, default_value = "./dig.log")]
    out: PathBuf,
}

/// The site's url universe: home page, list pages, movie detail pages.
fn build_urls() -> Vec<String> {
    let mut urls = vec!["http://localhost:8888/".to_string()];
    for id in LIST_IDS {
        urls.push(format!("http://localhost:8888/list/{id}.html"));
    }
    for id in MOVIE_IDS {
        urls.push(format!("http://localhost:8888/movie/{id}.html"));
    }
    urls
}

fn make_log_line(time: &str, url: &str, refer: &str, ua: &str) -> String {
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

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let urls = build_urls();
    let mut rng = rand::thread_rng();

    let mut out = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cli.out)
        .with_context(|| format!("failed to open {:?}", cli.out))?;

    let time = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let mut batch = String::new();
    for _ in 0..cli.total {
        let url = urls.choose(&mut rng).unwrap_or(&urls[0]);
        let refer = urls.choose(&mut rng).unwrap_or(&urls[0]);
        let ua = UA_LIST.choose(&mut rng).unwrap_or(&UA_LIST[0]);
        batch.push_str(&make_log_line(&time, url, refer, ua));
        batch.push('\n');
    }
    out.write_all(batch.as_bytes())
        .with_context(|| format!("failed to append to {:?}", cli.out))?;

    println!("appended {} lines to {:?}", cli.total, cli.out);
    Ok(())
}
