// src/config.rs

use std::{env, path::PathBuf, time::Duration};

use crate::fetch::urls;

/// Remote responses are reused within one bucket of this width.
pub const DEFAULT_CACHE_WINDOW: Duration = Duration::from_secs(30);

/// Everything one build run needs to know. There are no CLI flags; the only
/// knob read from the environment is the output directory (`DIST_DIR`).
#[derive(Debug, Clone)]
pub struct Config {
    pub opens_url: String,
    pub nhi_stores_url: String,
    pub backup_stores_url: String,
    pub cache_window: Duration,
    pub out_dir: PathBuf,
    pub opens_file: String,
    pub stores_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            opens_url: urls::OPENS_URL.to_string(),
            nhi_stores_url: urls::NHI_STORES_URL.to_string(),
            backup_stores_url: urls::BACKUP_STORES_URL.to_string(),
            cache_window: DEFAULT_CACHE_WINDOW,
            out_dir: PathBuf::from("dist"),
            opens_file: "opens.csv".to_string(),
            stores_file: "stores0430.csv".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(dir) = env::var("DIST_DIR") {
            if !dir.trim().is_empty() {
                cfg.out_dir = PathBuf::from(dir);
            }
        }
        cfg
    }

    pub fn opens_path(&self) -> PathBuf {
        self.out_dir.join(&self.opens_file)
    }

    pub fn stores_path(&self) -> PathBuf {
        self.out_dir.join(&self.stores_file)
    }
}
