// src/schema/stores.rs

use super::rules::{FieldRule, Fields, Kind, Schema, Validated};
use super::types::TestKitStockRecord;
use crate::error::Rejected;
use crate::fetch::Row;
use crate::process::normalize::normalize_text;
use crate::process::utils::{clean_str, parse_number, to_safe_integer, MAX_SAFE_INTEGER};

/// Bounds of the covered territory.
pub const LAT_RANGE: (f64, f64) = (21.0, 28.0);
pub const LNG_RANGE: (f64, f64) = (117.0, 123.0);

/// Schema for the live NHI stock feed.
pub fn nhi_stores_schema() -> Schema {
    Schema::new(
        "nhi_stores",
        vec![
            FieldRule::new("addr", "醫事機構地址", Kind::Text)
                .required()
                .after(normalize_text),
            FieldRule::new(
                "amount",
                "快篩試劑截至目前結餘存貨數量",
                Kind::integer(0.0, MAX_SAFE_INTEGER),
            )
            .required(),
            FieldRule::new("id", "醫事機構代碼", Kind::AlphaNum).required(),
            FieldRule::new("lat", "緯度", Kind::number(LAT_RANGE.0, LAT_RANGE.1))
                .missing_if(&["0"])
                .required(),
            FieldRule::new("lng", "經度", Kind::number(LNG_RANGE.0, LNG_RANGE.1))
                .missing_if(&["0"])
                .required(),
            FieldRule::new("name", "醫事機構名稱", Kind::Text).required(),
            FieldRule::new("notice", "備註", Kind::Text)
                .missing_if(&["-"])
                .default_text("")
                .after(normalize_text),
            FieldRule::new("tel", "醫事機構電話", Kind::Text)
                .required()
                .after(normalize_text),
            FieldRule::new("testkit", "廠牌項目", Kind::Text).required(),
            FieldRule::new("updatedAt", "來源資料時間", Kind::Timestamp).required(),
        ],
    )
}

impl TestKitStockRecord {
    pub fn from_fields(mut f: Fields) -> Result<Self, Rejected> {
        let amount = f.take_integer("amount")?;
        Ok(Self {
            id: f.take_text("id")?,
            name: f.take_text("name")?,
            addr: f.take_text("addr")?,
            tel: f.take_text("tel")?,
            amount: u64::try_from(amount).map_err(|_| Rejected::OutOfRange { field: "amount" })?,
            lat: f.take_number("lat")?,
            lng: f.take_number("lng")?,
            notice: f.take_text("notice")?,
            testkit: f.take_text("testkit")?,
            updated_at: f.take_integer("updatedAt")?,
        })
    }

    /// Decode a row of our own previously published snapshot. These rows
    /// were validated when first published, so decoding is lenient: only a
    /// missing `id` or an unreadable `updatedAt` drops the row.
    pub fn from_backup_row(row: &Row) -> Option<Self> {
        let text = |k: &str| cell(row, k).unwrap_or_default().to_string();

        let id = cell(row, "id")?.to_string();
        let updated_at = cell(row, "updatedAt").and_then(parse_number)?.trunc() as i64;
        Some(Self {
            id,
            name: text("name"),
            addr: text("addr"),
            tel: text("tel"),
            amount: to_safe_integer(cell(row, "amount")).max(0) as u64,
            lat: cell(row, "lat").and_then(parse_number).unwrap_or(0.0),
            lng: cell(row, "lng").and_then(parse_number).unwrap_or(0.0),
            notice: text("notice"),
            testkit: text("testkit"),
            updated_at,
        })
    }
}

fn cell<'a>(row: &'a Row, key: &str) -> Option<&'a str> {
    clean_str(row.get(key).map(String::as_str))
}

pub fn validate_nhi_stores(rows: &[Row]) -> Validated<TestKitStockRecord> {
    nhi_stores_schema().validate_all(rows, TestKitStockRecord::from_fields)
}

/// Decode backup rows; the second value counts undecodable rows.
pub fn decode_backup_stores(rows: &[Row]) -> (Vec<TestKitStockRecord>, usize) {
    let records: Vec<_> = rows
        .iter()
        .filter_map(TestKitStockRecord::from_backup_row)
        .collect();
    let dropped = rows.len() - records.len();
    (records, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nhi_row() -> Row {
        [
            ("醫事機構代碼", "5901010065"),
            ("醫事機構名稱", "大安藥局"),
            ("醫事機構地址", "台北市１２３號"),
            ("經度", "121.5432"),
            ("緯度", "25.0331"),
            ("醫事機構電話", "（０２）２７０１２３４５"),
            ("廠牌項目", "羅氏家用新冠抗原快篩"),
            ("快篩試劑截至目前結餘存貨數量", "50"),
            ("來源資料時間", "2022/04/30 09:15:00"),
            ("備註", "每人限購一盒。\n售完為止"),
            ("不相干欄位", "ignored"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn with(mut row: Row, k: &str, v: &str) -> Row {
        row.insert(k.to_string(), v.to_string());
        row
    }

    #[test]
    fn valid_row_is_typed_and_normalized() {
        let out = validate_nhi_stores(&[nhi_row()]);
        assert_eq!(out.rejected, 0);
        assert_eq!(
            out.records,
            vec![TestKitStockRecord {
                id: "5901010065".into(),
                name: "大安藥局".into(),
                addr: "台北市123號".into(),
                tel: "(02)27012345".into(),
                amount: 50,
                lat: 25.0331,
                lng: 121.5432,
                notice: "每人限購一盒;;售完為止".into(),
                testkit: "羅氏家用新冠抗原快篩".into(),
                updated_at: 1_651_281_300,
            }]
        );
    }

    #[test]
    fn placeholder_notice_defaults_to_empty() {
        let out = validate_nhi_stores(&[with(nhi_row(), "備註", " - ")]);
        assert_eq!(out.records[0].notice, "");
    }

    #[test]
    fn zero_coordinates_reject_the_row() {
        let out = validate_nhi_stores(&[
            with(nhi_row(), "緯度", "0"),
            with(nhi_row(), "經度", "0"),
        ]);
        assert!(out.records.is_empty());
        assert_eq!(out.rejected, 2);
    }

    #[test]
    fn each_constraint_rejects() {
        let bad = vec![
            with(nhi_row(), "醫事機構地址", " "),
            with(nhi_row(), "醫事機構名稱", ""),
            with(nhi_row(), "醫事機構電話", ""),
            with(nhi_row(), "廠牌項目", ""),
            with(nhi_row(), "醫事機構代碼", "59-01"),
            with(nhi_row(), "快篩試劑截至目前結餘存貨數量", "-1"),
            with(nhi_row(), "快篩試劑截至目前結餘存貨數量", "1.5"),
            with(nhi_row(), "快篩試劑截至目前結餘存貨數量", "很多"),
            with(nhi_row(), "緯度", "20.9"),
            with(nhi_row(), "經度", "123.1"),
            with(nhi_row(), "來源資料時間", "昨天"),
            with(nhi_row(), "來源資料時間", ""),
        ];
        let n = bad.len();
        let out = validate_nhi_stores(&bad);
        assert!(out.records.is_empty());
        assert_eq!(out.rejected, n);
    }

    #[test]
    fn name_and_testkit_are_not_normalized() {
        let row = with(
            with(nhi_row(), "醫事機構名稱", "藥局（總店）"),
            "廠牌項目",
            "快篩：１盒",
        );
        let out = validate_nhi_stores(&[row]);
        assert_eq!(out.records[0].name, "藥局（總店）");
        assert_eq!(out.records[0].testkit, "快篩：１盒");
    }

    #[test]
    fn backup_rows_decode_leniently() {
        let row: Row = [
            ("id", "A1"),
            ("name", "Clinic A"),
            ("amount", "oops"),
            ("lat", "25"),
            ("updatedAt", "1651281300"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let rec = TestKitStockRecord::from_backup_row(&row).unwrap();
        assert_eq!(rec.amount, 0);
        assert_eq!(rec.lat, 25.0);
        assert_eq!(rec.lng, 0.0);
        assert_eq!(rec.addr, "");
        assert_eq!(rec.updated_at, 1_651_281_300);
    }

    #[test]
    fn backup_rows_without_id_or_timestamp_are_dropped() {
        let no_id: Row = [("updatedAt", "1")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let no_ts: Row = [("id", "A1"), ("updatedAt", "soon")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let (records, dropped) = decode_backup_stores(&[no_id, no_ts]);
        assert!(records.is_empty());
        assert_eq!(dropped, 2);
    }
}
