//! Local civil time for post timestamps, and dates written into captions.

use chrono::{DateTime, FixedOffset, NaiveDate};
use core_runtime::config::CaptionDateFormat;
use once_cell::sync::Lazy;
use regex::Regex;

static COMPACT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{2})(\d{2})(\d{2})\b").expect("compact date pattern is valid"));

static ISO_LIKE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{4})[-./](\d{1,2})[-./](\d{1,2})\b").expect("iso-like date pattern is valid")
});

/// Civil date and time at a fixed offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalStamp {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM:SS`
    pub time: String,
}

fn at_offset(epoch_secs: i64, offset_hours: i32) -> Option<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(offset_hours * 3600)?;
    DateTime::from_timestamp(epoch_secs, 0).map(|utc| utc.with_timezone(&offset))
}

/// Convert an epoch timestamp to local date and time.
pub fn local_stamp(epoch_secs: i64, offset_hours: i32) -> Option<LocalStamp> {
    let local = at_offset(epoch_secs, offset_hours)?;
    Some(LocalStamp {
        date: local.format("%Y-%m-%d").to_string(),
        time: local.format("%H:%M:%S").to_string(),
    })
}

/// Local date only, as used by the extraction output contract.
pub fn local_date(epoch_secs: i64, offset_hours: i32) -> Option<String> {
    local_stamp(epoch_secs, offset_hours).map(|stamp| stamp.date)
}

/// First valid date in `caption`, trying `formats` in order.
pub fn caption_date(caption: &str, formats: &[CaptionDateFormat]) -> Option<NaiveDate> {
    formats.iter().find_map(|format| match format {
        CaptionDateFormat::Compact => find_date(&COMPACT_RE, caption, |y| 2000 + y),
        CaptionDateFormat::IsoLike => find_date(&ISO_LIKE_RE, caption, |y| y),
    })
}

fn find_date(re: &Regex, caption: &str, year: impl Fn(i32) -> i32) -> Option<NaiveDate> {
    re.captures_iter(caption).find_map(|caps| {
        let y: i32 = caps[1].parse().ok()?;
        let m: u32 = caps[2].parse().ok()?;
        let d: u32 = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year(y), m, d)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_ORDER: [CaptionDateFormat; 2] =
        [CaptionDateFormat::Compact, CaptionDateFormat::IsoLike];

    #[test]
    fn test_local_stamp_shifts_by_offset() {
        // 2019-07-14T20:30:00Z
        let stamp = local_stamp(1_563_136_200, 8).unwrap();
        assert_eq!(stamp.date, "2019-07-15");
        assert_eq!(stamp.time, "04:30:00");

        let utc = local_stamp(1_563_136_200, 0).unwrap();
        assert_eq!(utc.date, "2019-07-14");
        assert_eq!(utc.time, "20:30:00");
    }

    #[test]
    fn test_local_stamp_rejects_bad_offset() {
        assert!(local_stamp(0, 30).is_none());
    }

    #[test]
    fn test_compact_token() {
        let date = caption_date("drop 190714 at noon", &DEFAULT_ORDER).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2019, 7, 14).unwrap());
    }

    #[test]
    fn test_compact_skips_impossible_dates() {
        // 991399 is not a date; the next token is
        let date = caption_date("ref 991399 / 240229", &DEFAULT_ORDER).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_iso_like_separators() {
        for caption in ["on 2021-03-05", "on 2021.3.5", "on 2021/03/5"] {
            assert_eq!(
                caption_date(caption, &DEFAULT_ORDER),
                NaiveDate::from_ymd_opt(2021, 3, 5),
                "{}",
                caption
            );
        }
    }

    #[test]
    fn test_preference_order() {
        let caption = "2020-01-02 reposted 210304";
        assert_eq!(
            caption_date(caption, &DEFAULT_ORDER),
            NaiveDate::from_ymd_opt(2021, 3, 4)
        );
        assert_eq!(
            caption_date(caption, &[CaptionDateFormat::IsoLike, CaptionDateFormat::Compact]),
            NaiveDate::from_ymd_opt(2020, 1, 2)
        );
    }

    #[test]
    fn test_no_date() {
        assert!(caption_date("just words 12345", &DEFAULT_ORDER).is_none());
        assert!(caption_date("anything", &[]).is_none());
    }
}
