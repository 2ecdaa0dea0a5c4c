//! Date helper functions

use chrono::{DateTime, Datelike, TimeZone};

use crate::i18n::Locale;

/// Format a publication date as a short localized date string
///
/// Day of month (two digits), abbreviated month name, four-digit year:
/// `15 mar 2021`. Month names come from the compiled-in locale tables,
/// never from the environment.
///
/// # Examples
/// ```ignore
/// format_short_date(&date, Locale::PtBr) // -> "15 mar 2021"
/// ```
pub fn format_short_date<Tz: TimeZone>(date: &DateTime<Tz>, locale: Locale) -> String {
    format!(
        "{:02} {} {}",
        date.day(),
        locale.month_abbr(date.month0() as usize),
        date.year()
    )
}

/// Format a date for the `datetime` attribute of a `<time>` element
pub fn date_attr<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%d").to_string()
}

/// Format a date in ISO 8601 / XML format (Atom feeds)
pub fn date_xml<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_format_short_date_pt_br() {
        let date = Utc.with_ymd_and_hms(2021, 3, 15, 19, 25, 28).unwrap();
        assert_eq!(format_short_date(&date, Locale::PtBr), "15 mar 2021");
    }

    #[test]
    fn test_format_short_date_pads_day() {
        let date = Utc.with_ymd_and_hms(2021, 4, 5, 0, 0, 0).unwrap();
        assert_eq!(format_short_date(&date, Locale::PtBr), "05 abr 2021");
        assert_eq!(format_short_date(&date, Locale::En), "05 Apr 2021");
    }

    #[test]
    fn test_format_short_date_is_deterministic() {
        let date = Utc.with_ymd_and_hms(2022, 12, 1, 8, 30, 0).unwrap();
        let first = format_short_date(&date, Locale::PtBr);
        for _ in 0..10 {
            assert_eq!(format_short_date(&date, Locale::PtBr), first);
        }
        assert_eq!(first, "01 dez 2022");
    }

    #[test]
    fn test_date_attr() {
        let date = Utc.with_ymd_and_hms(2021, 3, 15, 19, 25, 28).unwrap();
        assert_eq!(date_attr(&date), "2021-03-15");
    }

    #[test]
    fn test_date_xml() {
        let date = Utc.with_ymd_and_hms(2021, 3, 15, 19, 25, 28).unwrap();
        assert_eq!(date_xml(&date), "2021-03-15T19:25:28+00:00");
    }
}
