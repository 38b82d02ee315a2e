pub mod opens;
pub mod rules;
pub mod stores;
pub mod types;
pub mod write;

pub use opens::validate_opens;
pub use rules::{FieldRule, Fields, Kind, Schema, Validated, Value};
pub use stores::{decode_backup_stores, validate_nhi_stores};
pub use types::{OpenHoursRecord, TestKitStockRecord};
pub use write::write_records;
