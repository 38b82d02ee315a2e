// src/pipeline.rs

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use tracing::{info, instrument};

use crate::config::Config;
use crate::error::PipelineError;
use crate::fetch::{Row, RowSource};
use crate::process::date_parser::start_of_local_day;
use crate::process::merge::{merge_stores, MergeOutcome};
use crate::schema::{
    decode_backup_stores, validate_nhi_stores, validate_opens, write_records, OpenHoursRecord,
    TestKitStockRecord, Validated,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatasetReport {
    pub kept: usize,
    pub rejected: usize,
}

impl<T> From<&Validated<T>> for DatasetReport {
    fn from(v: &Validated<T>) -> Self {
        Self {
            kept: v.records.len(),
            rejected: v.rejected,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreReport {
    pub nhi: DatasetReport,
    pub backup_rows: usize,
    /// Undecodable plus stale backup rows.
    pub backup_dropped: usize,
    pub merged: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub opens: DatasetReport,
    pub stores: StoreReport,
}

async fn fetch<S: RowSource + ?Sized>(source: &S, url: &str) -> Result<Vec<Row>, PipelineError> {
    source
        .fetch_rows(url)
        .await
        .map_err(|source| PipelineError::FetchFailed {
            url: url.to_string(),
            source,
        })
}

fn write_table<T: Serialize>(path: &Path, header: &[&str], records: &[T]) -> Result<(), PipelineError> {
    write_records(path, header, records).map_err(|source| PipelineError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    })
}

/// Fetch and validate the clinic opening-hours feed.
#[instrument(level = "info", skip_all)]
pub async fn fetch_opens<S: RowSource + ?Sized>(
    source: &S,
    config: &Config,
) -> Result<Validated<OpenHoursRecord>> {
    let rows = fetch(source, &config.opens_url).await?;
    validate_opens(&rows)
}

/// Fetch and validate the live NHI stock feed.
#[instrument(level = "info", skip_all)]
pub async fn fetch_nhi_stores<S: RowSource + ?Sized>(
    source: &S,
    config: &Config,
) -> Result<Validated<TestKitStockRecord>> {
    let rows = fetch(source, &config.nhi_stores_url).await?;
    Ok(validate_nhi_stores(&rows))
}

/// Fetch our last published snapshot. Returns decoded records, the raw row
/// count and the number of undecodable rows.
#[instrument(level = "info", skip_all)]
pub async fn fetch_backup_stores<S: RowSource + ?Sized>(
    source: &S,
    config: &Config,
) -> Result<(Vec<TestKitStockRecord>, usize, usize)> {
    let rows = fetch(source, &config.backup_stores_url).await?;
    let (records, dropped) = decode_backup_stores(&rows);
    Ok((records, rows.len(), dropped))
}

/// Both stock sources are fetched jointly; the merge starts only once
/// both have arrived, and either failing aborts the stock branch.
#[instrument(level = "info", skip_all)]
pub async fn fetch_stores<S: RowSource + ?Sized>(
    source: &S,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<(MergeOutcome, StoreReport)> {
    let (nhi, (backup, backup_rows, undecodable)) = tokio::try_join!(
        fetch_nhi_stores(source, config),
        fetch_backup_stores(source, config)
    )?;

    let day_start = start_of_local_day(now).context("computing start of local day")?;
    let nhi_report = DatasetReport::from(&nhi);
    let outcome = merge_stores(backup, nhi.records, day_start);

    let report = StoreReport {
        nhi: nhi_report,
        backup_rows,
        backup_dropped: undecodable + outcome.stale,
        merged: outcome.stores.len(),
    };
    Ok((outcome, report))
}

async fn build_opens<S: RowSource + ?Sized>(source: &S, config: &Config) -> Result<DatasetReport> {
    let opens = fetch_opens(source, config).await?;
    write_table(&config.opens_path(), &OpenHoursRecord::COLUMNS, &opens.records)?;
    Ok(DatasetReport::from(&opens))
}

async fn build_stores<S: RowSource + ?Sized>(
    source: &S,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<StoreReport> {
    let (outcome, report) = fetch_stores(source, config, now).await?;
    write_table(
        &config.stores_path(),
        &TestKitStockRecord::COLUMNS,
        outcome.stores.records(),
    )?;
    Ok(report)
}

/// One full batch refresh: both tables are produced concurrently and both
/// branches run to completion. If either fails, its error is returned
/// after the other branch has written its own file.
#[instrument(level = "info", skip(source, config), fields(out = %config.out_dir.display()))]
pub async fn build<S: RowSource + ?Sized>(
    source: &S,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<BuildReport> {
    tokio::fs::create_dir_all(&config.out_dir)
        .await
        .map_err(|e| PipelineError::OutputWriteFailed {
            path: config.out_dir.clone(),
            source: e.into(),
        })?;

    let (opens, stores) = tokio::join!(
        build_opens(source, config),
        build_stores(source, config, now)
    );
    let report = BuildReport {
        opens: opens?,
        stores: stores?,
    };

    info!(
        opens = report.opens.kept,
        opens_rejected = report.opens.rejected,
        nhi_stores = report.stores.nhi.kept,
        nhi_rejected = report.stores.nhi.rejected,
        backup_rows = report.stores.backup_rows,
        backup_dropped = report.stores.backup_dropped,
        merged = report.stores.merged,
        "build finished"
    );
    Ok(report)
}
