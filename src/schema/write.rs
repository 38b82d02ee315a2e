use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Write `records` as CSV to `path`, header row first.
///
/// - `header`: column names, in the same order the record type serializes
/// - the header is written even when `records` is empty
/// - written to a dot-prefixed sibling tmp file, then renamed over `path`,
///   so a failure never leaves a partial target behind
pub fn write_records<T: Serialize, P: AsRef<Path>>(
    path: P,
    header: &[&str],
    records: &[T],
) -> Result<()> {
    let path = path.as_ref();
    let tmp_path = tmp_path_for(path);

    if let Err(e) = write_csv(&tmp_path, header, records) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    fs::rename(&tmp_path, path)
        .with_context(|| format!("renaming {:?} -> {:?}", tmp_path, path))?;
    Ok(())
}

fn write_csv<T: Serialize>(tmp_path: &Path, header: &[&str], records: &[T]) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .from_path(tmp_path)
        .with_context(|| format!("creating {:?}", tmp_path))?;

    wtr.write_record(header).context("writing header row")?;
    for (idx, rec) in records.iter().enumerate() {
        wtr.serialize(rec)
            .with_context(|| format!("serializing record {}", idx))?;
    }
    wtr.flush()
        .with_context(|| format!("flushing {:?}", tmp_path))?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{OpenHoursRecord, TestKitStockRecord};
    use tempfile::tempdir;

    #[test]
    fn writes_header_then_rows_in_declared_order() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("stores.csv");
        let rec = TestKitStockRecord {
            id: "A1".into(),
            name: "Clinic, A".into(),
            addr: "台北市123號".into(),
            tel: "(02)1234".into(),
            amount: 50,
            lat: 25.0,
            lng: 121.5432,
            notice: String::new(),
            testkit: "快篩".into(),
            updated_at: 1_651_281_300,
        };
        write_records(&path, &TestKitStockRecord::COLUMNS, &[rec])?;

        let text = fs::read_to_string(&path)?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "id,name,addr,tel,amount,lat,lng,notice,testkit,updatedAt"
        );
        assert_eq!(
            lines[1],
            "A1,\"Clinic, A\",台北市123號,(02)1234,50,25,121.5432,,快篩,1651281300"
        );
        assert_eq!(lines.len(), 2);
        assert!(!dir.path().join(".stores.csv.tmp").exists());
        Ok(())
    }

    #[test]
    fn empty_batch_still_gets_a_header() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("opens.csv");
        write_records::<OpenHoursRecord, _>(&path, &OpenHoursRecord::COLUMNS, &[])?;
        assert_eq!(fs::read_to_string(&path)?.trim_end(), "id,name,time,notice");
        Ok(())
    }

    #[test]
    fn failed_write_leaves_no_target() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("missing_dir").join("opens.csv");
        let err = write_records::<OpenHoursRecord, _>(&path, &OpenHoursRecord::COLUMNS, &[]);
        assert!(err.is_err());
        assert!(!path.exists());
        Ok(())
    }
}
