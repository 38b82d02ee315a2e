use chrono::{DateTime, FixedOffset, TimeZone, Utc};

/// NHI timestamps are wall-clock Taipei time with no offset marker.
pub const LOCAL_OFFSET_SECS: i32 = 8 * 3600;

/// Raw source text with `+08:00` appended.
pub const SOURCE_TS_FORMAT: &str = "%Y/%m/%d %H:%M:%S%:z";

/// `"YYYY/MM/DD HH:MM:SS"` (Taipei local) → unix seconds
pub fn parse_source_timestamp(raw: &str) -> Option<i64> {
    let stamped = format!("{}+08:00", raw.trim());
    DateTime::parse_from_str(&stamped, SOURCE_TS_FORMAT)
        .ok()
        .map(|dt| dt.timestamp())
}

/// Unix seconds of 00:00:00 Taipei time on the local day containing `now`.
pub fn start_of_local_day(now: DateTime<Utc>) -> Option<i64> {
    let offset = FixedOffset::east_opt(LOCAL_OFFSET_SECS)?;
    let midnight = now
        .with_timezone(&offset)
        .date_naive()
        .and_hms_opt(0, 0, 0)?;
    offset
        .from_local_datetime(&midnight)
        .single()
        .map(|dt| dt.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_taipei_wall_clock() {
        // 2022-04-30 09:15:00 +08:00 == 2022-04-30 01:15:00 UTC
        assert_eq!(
            parse_source_timestamp(" 2022/04/30 09:15:00 "),
            Some(1_651_281_300)
        );
    }

    #[test]
    fn rejects_garbage_and_partial_timestamps() {
        assert_eq!(parse_source_timestamp(""), None);
        assert_eq!(parse_source_timestamp("2022/04/30"), None);
        assert_eq!(parse_source_timestamp("2022-04-30 09:15:00"), None);
        assert_eq!(parse_source_timestamp("2022/13/01 00:00:00"), None);
        assert_eq!(parse_source_timestamp("2022/04/30 09:15:00+0800"), None);
    }

    #[test]
    fn local_day_starts_at_taipei_midnight() {
        // 2022-04-30 17:00 UTC is already 2022-05-01 01:00 in Taipei
        let now = Utc.with_ymd_and_hms(2022, 4, 30, 17, 0, 0).unwrap();
        let start = start_of_local_day(now).unwrap();
        let expected = Utc.with_ymd_and_hms(2022, 4, 30, 16, 0, 0).unwrap();
        assert_eq!(start, expected.timestamp());

        let earlier = Utc.with_ymd_and_hms(2022, 4, 30, 15, 59, 59).unwrap();
        assert_eq!(
            start_of_local_day(earlier),
            Some(expected.timestamp() - 86_400)
        );
    }
}
