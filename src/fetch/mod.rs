// src/fetch/mod.rs

use anyhow::Result;
use async_trait::async_trait;
use std::{collections::HashMap, time::Duration};

pub mod rows;
pub mod urls;

pub use rows::{parse_csv_rows, HttpRowSource};

/// One CSV record keyed by header name. Cells missing from a short record
/// are absent keys rather than empty strings.
pub type Row = HashMap<String, String>;

/// Anything that can turn a feed URL into headered rows. The pipeline only
/// talks to this trait, so tests feed it canned rows.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch_rows(&self, url: &str) -> Result<Vec<Row>>;
}

/// `floor(unix_millis / window_millis)`: requests sharing a bucket share a
/// cache entry. A zero-width window degrades to one bucket per millisecond.
pub fn cache_bucket(unix_millis: i64, window: Duration) -> i64 {
    let width = (window.as_millis() as i64).max(1);
    unix_millis.div_euclid(width)
}
