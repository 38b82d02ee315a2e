// src/schema/types.rs

use serde::{Serialize, Serializer};

/// One clinic's fixed weekly service hours.
#[derive(Debug, Serialize, PartialEq, Clone, Eq)]
pub struct OpenHoursRecord {
    pub id: String,
    pub name: String,
    /// 21 chars of `0`/`1` (3 periods × 7 days), or empty when unknown.
    pub time: String,
    pub notice: String,
}

impl OpenHoursRecord {
    pub const COLUMNS: [&'static str; 4] = ["id", "name", "time", "notice"];
}

/// One pharmacy/clinic's rapid-test-kit stock.
#[derive(Debug, Serialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TestKitStockRecord {
    pub id: String,
    pub name: String,
    pub addr: String,
    pub tel: String,
    pub amount: u64,
    #[serde(serialize_with = "shortest_decimal")]
    pub lat: f64,
    #[serde(serialize_with = "shortest_decimal")]
    pub lng: f64,
    pub notice: String,
    pub testkit: String,
    /// Unix seconds.
    pub updated_at: i64,
}

impl TestKitStockRecord {
    pub const COLUMNS: [&'static str; 10] = [
        "id",
        "name",
        "addr",
        "tel",
        "amount",
        "lat",
        "lng",
        "notice",
        "testkit",
        "updatedAt",
    ];
}

// `25` rather than `25.0`
fn shortest_decimal<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(v)
}
