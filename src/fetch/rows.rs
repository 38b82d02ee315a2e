// src/fetch/rows.rs

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use csv::ReaderBuilder;
use reqwest::Client;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};
use tracing::{debug, instrument};
use url::Url;

use super::{cache_bucket, Row, RowSource};

/// Parse headered CSV text into rows. Surrounding whitespace and a leading
/// UTF-8 BOM are ignored; records may be shorter or longer than the header.
pub fn parse_csv_rows(text: &str) -> Result<Vec<Row>> {
    let text = text.trim_start_matches('\u{feff}').trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = rdr
        .headers()
        .context("reading CSV header row")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error at record {}", idx))?;
        let row: Row = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Fetches CSV feeds over HTTP, memoizing each `(url, bucket)` so repeated
/// requests inside one cache window never hit the network twice.
pub struct HttpRowSource {
    client: Client,
    window: Duration,
    cache: Mutex<HashMap<(String, i64), Arc<Vec<Row>>>>,
}

impl HttpRowSource {
    pub fn new(client: Client, window: Duration) -> Self {
        Self {
            client,
            window,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, key: &(String, i64)) -> Option<Arc<Vec<Row>>> {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.get(key).cloned()
    }

    fn remember(&self, key: (String, i64), rows: Arc<Vec<Row>>) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.retain(|(_, bucket), _| *bucket >= key.1);
        cache.insert(key, rows);
    }

    async fn get_text(&self, url: &str, bucket: i64) -> Result<String> {
        let mut target = Url::parse(url).with_context(|| format!("parsing feed URL {}", url))?;
        target
            .query_pairs_mut()
            .append_pair("cachebust", &bucket.to_string());

        debug!(url = %target, "fetching feed");
        self.client
            .get(target.clone())
            .send()
            .await
            .with_context(|| format!("GET {}", target))?
            .error_for_status()
            .with_context(|| format!("non-success status from {}", target))?
            .text()
            .await
            .with_context(|| format!("reading body from {}", target))
    }
}

#[async_trait]
impl RowSource for HttpRowSource {
    #[instrument(level = "debug", skip(self))]
    async fn fetch_rows(&self, url: &str) -> Result<Vec<Row>> {
        let bucket = cache_bucket(Utc::now().timestamp_millis(), self.window);
        let key = (url.to_string(), bucket);
        if let Some(rows) = self.cached(&key) {
            debug!(url, bucket, "cache hit");
            return Ok(rows.as_ref().clone());
        }

        let text = self.get_text(url, bucket).await?;
        let rows = parse_csv_rows(&text).with_context(|| format!("parsing CSV from {}", url))?;
        debug!(url, rows = rows.len(), "parsed feed");

        let rows = Arc::new(rows);
        self.remember(key, Arc::clone(&rows));
        Ok(rows.as_ref().clone())
    }
}
