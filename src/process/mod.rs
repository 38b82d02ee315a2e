// src/process/mod.rs
pub mod date_parser;
pub mod merge;
pub mod normalize;
pub mod utils;

pub use merge::{merge_stores, MergeOutcome, MergedStoreCollection};
pub use normalize::normalize_text;
