// src/fetch/urls.rs

/// NHI contracted clinics: fixed weekly service hours.
pub static OPENS_URL: &str = "https://data.nhi.gov.tw/resource/Opendata/%E5%85%A8%E6%B0%91%E5%81%A5%E5%BA%B7%E4%BF%9D%E9%9A%AA%E7%89%B9%E7%B4%84%E9%99%A2%E6%89%80%E5%9B%BA%E5%AE%9A%E6%9C%8D%E5%8B%99%E6%99%82%E6%AE%B5.csv";

/// NHI live rapid-test-kit stock feed (authoritative).
pub static NHI_STORES_URL: &str = "https://data.nhi.gov.tw/resource/Nhi_Fst/Fstdata.csv";

/// Our own previously published merged snapshot (stale backup).
pub static BACKUP_STORES_URL: &str =
    "https://taichunmin.idv.tw/covid19-testkit-maps-crawler/stores0430.csv";
