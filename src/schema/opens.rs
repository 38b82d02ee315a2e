// src/schema/opens.rs

use anyhow::{Context, Result};
use regex::Regex;

use super::rules::{FieldRule, Fields, Kind, Schema, Validated};
use super::types::OpenHoursRecord;
use crate::error::Rejected;
use crate::fetch::Row;

/// 3 periods × 7 days.
pub const GRID_PATTERN: &str = "^[01]{21}$";

/// NHI encodes the grid as `N` (open) / `Y` (closed).
pub fn substitute_grid_letters(s: &str) -> String {
    s.replace('N', "1").replace('Y', "0")
}

pub fn opens_schema() -> Result<Schema> {
    let grid = Regex::new(GRID_PATTERN).context("compiling schedule grid pattern")?;
    Ok(Schema::new(
        "opens",
        vec![
            FieldRule::new("id", "醫事機構代碼", Kind::AlphaNum).required(),
            FieldRule::new("name", "醫事機構名稱", Kind::Text).required(),
            FieldRule::new("time", "看診星期", Kind::Pattern(grid))
                .before(substitute_grid_letters)
                .default_text(""),
            FieldRule::new("notice", "看診備註", Kind::Text)
                .missing_if(&["-"])
                .default_text(""),
            FieldRule::new("opened", "開業狀況", Kind::OneOf(&["0"])).strip(),
        ],
    ))
}

impl OpenHoursRecord {
    pub fn from_fields(mut f: Fields) -> Result<Self, Rejected> {
        Ok(Self {
            id: f.take_text("id")?,
            name: f.take_text("name")?,
            time: f.take_text("time")?,
            notice: f.take_text("notice")?,
        })
    }
}

pub fn validate_opens(rows: &[Row]) -> Result<Validated<OpenHoursRecord>> {
    let schema = opens_schema()?;
    Ok(schema.validate_all(rows, OpenHoursRecord::from_fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, name: &str, time: &str, notice: &str) -> Row {
        [
            ("醫事機構代碼", id),
            ("醫事機構名稱", name),
            ("看診星期", time),
            ("看診備註", notice),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn letter_grid_becomes_bits() -> Result<()> {
        let grid = format!("{}Y", "N".repeat(20));
        let out = validate_opens(&[raw("0101090517", " 臺大醫院 ", &grid, "-")])?;
        assert_eq!(out.rejected, 0);
        assert_eq!(
            out.records,
            vec![OpenHoursRecord {
                id: "0101090517".into(),
                name: "臺大醫院".into(),
                time: format!("{}0", "1".repeat(20)),
                notice: String::new(),
            }]
        );
        Ok(())
    }

    #[test]
    fn blank_schedule_defaults_to_empty() -> Result<()> {
        let out = validate_opens(&[raw("A1", "Clinic A", "  ", " 週日休診 ")])?;
        assert_eq!(out.records[0].time, "");
        assert_eq!(out.records[0].notice, "週日休診");
        Ok(())
    }

    #[test]
    fn rejects_bad_rows() -> Result<()> {
        let rows = vec![
            raw("", "Clinic", "", ""),
            raw("A1", "   ", "", ""),
            raw("A-1", "Clinic", "", ""),
            raw("A1", "Clinic", &"N".repeat(20), ""),
            raw("A1", "Clinic", &format!("{}X", "N".repeat(20)), ""),
            raw("A1", "Clinic", &"1".repeat(22), ""),
            raw("B2", "Clinic B", &"0".repeat(21), ""),
        ];
        let out = validate_opens(&rows)?;
        assert_eq!(out.rejected, 6);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].id, "B2");
        Ok(())
    }

    #[test]
    fn operating_status_filters_but_is_not_kept() -> Result<()> {
        let mut open = raw("A1", "Clinic A", "", "");
        open.insert("開業狀況".into(), " 0 ".into());
        let mut closed = raw("B2", "Clinic B", "", "");
        closed.insert("開業狀況".into(), "1".into());

        let out = validate_opens(&[open, closed])?;
        assert_eq!(out.rejected, 1);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].id, "A1");
        Ok(())
    }
}
