//! Three-stage parse cascade for a matched timestamp substring.
//!
//! Input has already had its timezone marker stripped, so every parser here
//! produces a local [`NaiveDateTime`]; the engine applies the offset.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

use super::months::{ENGLISH_MONTH_PATTERN, english_month, month_from_name};
use crate::models::ParseMethod;

pub type Parser = fn(&str) -> Option<NaiveDateTime>;

/// Tried in order; the first parser to produce a value wins
pub const CASCADE: &[(ParseMethod, Parser)] = &[
    (ParseMethod::Manual, parse_manual),
    (ParseMethod::FormatTable, parse_format_table),
    (ParseMethod::Generic, parse_generic),
];

static MANUAL: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"^(?P<mon>{})\s(?P<day>\d{{1,2}}),?\s(?P<year>\d{{4}}),?\s(?:at\s)?(?P<hour>\d{{1,2}}):(?P<min>\d{{2}})(?::(?P<sec>\d{{2}}))?(?:\s?(?P<mer>AM|PM))?$",
        ENGLISH_MONTH_PATTERN
    );
    Regex::new(&pattern).expect("manual timestamp regex compiles")
});

/// Component parser for the primary export layout
/// (`Aug 11, 2025, 10:30:00 PM`), with explicit 12-hour conversion
pub fn parse_manual(text: &str) -> Option<NaiveDateTime> {
    let caps = MANUAL.captures(text.trim())?;
    let month = english_month(&caps["mon"])?;
    let day: u32 = caps["day"].parse().ok()?;
    let year: i32 = caps["year"].parse().ok()?;
    let hour: u32 = caps["hour"].parse().ok()?;
    let minute: u32 = caps["min"].parse().ok()?;
    let second: u32 = caps.name("sec").map_or(Some(0), |s| s.as_str().parse().ok())?;
    let hour = to_24_hour(hour, caps.name("mer").map(|m| m.as_str()))?;

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = NaiveTime::from_hms_opt(hour, minute, second)?;
    Some(date.and_time(time))
}

/// Convert a 12-hour clock reading; without a meridiem the hour is taken as 24-hour
pub fn to_24_hour(hour: u32, meridiem: Option<&str>) -> Option<u32> {
    match meridiem {
        Some(_) if !(1..=12).contains(&hour) => None,
        Some(m) if m.eq_ignore_ascii_case("PM") => Some(if hour == 12 { 12 } else { hour + 12 }),
        Some(_) => Some(if hour == 12 { 0 } else { hour }),
        None => (hour <= 23).then_some(hour),
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%b %d, %Y, %I:%M:%S %p",
    "%b %d, %Y %I:%M:%S %p",
    "%B %d, %Y, %I:%M:%S %p",
    "%B %d, %Y at %I:%M:%S %p",
    "%b %d, %Y, %I:%M %p",
    "%B %d, %Y at %I:%M %p",
    "%b %d, %Y, %H:%M:%S",
    "%d %b %Y, %H:%M:%S",
    "%d %B %Y, %H:%M:%S",
    "%d %b %Y, %H:%M",
    "%d %B %Y at %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y, %I:%M:%S %p",
    "%m/%d/%Y, %I:%M %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y, %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y, %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d.%m.%Y, %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y, %H:%M",
    "%d.%m.%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%b %d, %Y", "%B %d, %Y", "%Y-%m-%d", "%Y/%m/%d"];

/// Known layouts tried through chrono's format parser
pub fn parse_format_table(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

static TIME_OF_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<hour>\d{1,2})[:h](?P<min>\d{2})(?::(?P<sec>\d{2}))?")
        .expect("time-of-day regex compiles")
});

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{L}+\.?|\d+").expect("token regex compiles"));

const PM_MARKERS: &[&str] = &["PM", "午後", "下午", "오후"];
const AM_MARKERS: &[&str] = &["AM", "午前", "上午", "오전"];

/// Last-resort parser: find a year, a month (named or numeric), a day and an
/// optional time of day anywhere in the text
pub fn parse_generic(text: &str) -> Option<NaiveDateTime> {
    let (time, rest) = match TIME_OF_DAY.captures(text) {
        Some(caps) => {
            let whole = caps.get(0)?;
            let hour: u32 = caps["hour"].parse().ok()?;
            let minute: u32 = caps["min"].parse().ok()?;
            let second: u32 = caps.name("sec").map_or(Some(0), |s| s.as_str().parse().ok())?;
            let meridiem = if PM_MARKERS.iter().any(|m| text.contains(m)) {
                Some("PM")
            } else if AM_MARKERS.iter().any(|m| text.contains(m)) {
                Some("AM")
            } else {
                None
            };
            let hour = to_24_hour(hour, meridiem)?;
            let rest = format!("{} {}", &text[..whole.start()], &text[whole.end()..]);
            (NaiveTime::from_hms_opt(hour, minute, second)?, rest)
        }
        None => (NaiveTime::MIN, text.to_string()),
    };

    let date = generic_date(&rest)?;
    Some(date.and_time(time))
}

fn generic_date(text: &str) -> Option<NaiveDate> {
    let mut month_name = None;
    let mut numbers: Vec<(usize, u32, usize)> = Vec::new();

    for token in TOKEN.find_iter(text) {
        let value = token.as_str();
        if value.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(number) = value.parse() {
                numbers.push((token.start(), number, value.len()));
            }
        } else if month_name.is_none() {
            month_name = month_from_name(value);
        }
    }

    let year_index = numbers.iter().position(|(_, n, len)| *len == 4 && (1900..=2100).contains(n))?;
    let (year_pos, year, _) = numbers.remove(year_index);
    let year = i32::try_from(year).ok()?;

    if let Some(month) = month_name {
        let (_, day, _) = numbers.iter().find(|(_, n, _)| (1..=31).contains(n))?;
        return NaiveDate::from_ymd_opt(year, month, *day);
    }

    let [(first_pos, first, _), (_, second, _), ..] = numbers.as_slice() else {
        return None;
    };
    let (month, day) = if year_pos < *first_pos {
        (*first, *second)
    } else if *first > 12 {
        (*second, *first)
    } else if *second > 12 {
        (*first, *second)
    } else if text.contains('.') {
        // dotted numeric dates are day-first
        (*second, *first)
    } else {
        (*first, *second)
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d).unwrap().and_hms_opt(h, mi, s).unwrap()
    }

    #[test]
    fn test_manual_primary_format() {
        assert_eq!(parse_manual("Aug 11, 2025, 10:30:00 PM"), Some(at(2025, 8, 11, 22, 30, 0)));
        assert_eq!(parse_manual("Jan 1, 2024, 12:05:09 AM"), Some(at(2024, 1, 1, 0, 5, 9)));
        assert_eq!(parse_manual("Mar 3, 2023, 12:00:00 PM"), Some(at(2023, 3, 3, 12, 0, 0)));
        assert_eq!(parse_manual("September 9, 2019 at 7:15 AM"), Some(at(2019, 9, 9, 7, 15, 0)));
    }

    #[test]
    fn test_manual_rejects_invalid_components() {
        assert_eq!(parse_manual("Feb 30, 2024, 10:00:00 PM"), None);
        assert_eq!(parse_manual("Aug 11, 2025, 13:30:00 PM"), None);
        assert_eq!(parse_manual("11 Aug 2025, 22:30:00"), None);
    }

    #[test]
    fn test_to_24_hour() {
        assert_eq!(to_24_hour(12, Some("AM")), Some(0));
        assert_eq!(to_24_hour(12, Some("PM")), Some(12));
        assert_eq!(to_24_hour(1, Some("pm")), Some(13));
        assert_eq!(to_24_hour(0, Some("AM")), None);
        assert_eq!(to_24_hour(23, None), Some(23));
        assert_eq!(to_24_hour(24, None), None);
    }

    #[test]
    fn test_format_table_layouts() {
        assert_eq!(parse_format_table("11 Aug 2025, 22:30:00"), Some(at(2025, 8, 11, 22, 30, 0)));
        assert_eq!(parse_format_table("2025-08-11T22:30:00.250").map(|d| d.date()), NaiveDate::from_ymd_opt(2025, 8, 11));
        assert_eq!(parse_format_table("11.08.2025, 22:30:00"), Some(at(2025, 8, 11, 22, 30, 0)));
        assert_eq!(parse_format_table("08/11/2025, 10:30 PM"), Some(at(2025, 8, 11, 22, 30, 0)));
        assert_eq!(parse_format_table("25/08/2025 22:30"), Some(at(2025, 8, 25, 22, 30, 0)));
        assert_eq!(parse_format_table("Aug 11, 2025"), Some(at(2025, 8, 11, 0, 0, 0)));
    }

    #[test]
    fn test_generic_localized_and_cjk() {
        assert_eq!(parse_generic("11 août 2025 à 22:30:00"), Some(at(2025, 8, 11, 22, 30, 0)));
        assert_eq!(parse_generic("11 de ago. de 2025, 22:30:00"), Some(at(2025, 8, 11, 22, 30, 0)));
        assert_eq!(parse_generic("2025年8月11日 22:30:00"), Some(at(2025, 8, 11, 22, 30, 0)));
        assert_eq!(parse_generic("2025年8月11日 午後 10:30"), Some(at(2025, 8, 11, 22, 30, 0)));
    }

    #[test]
    fn test_generic_numeric_ordering() {
        assert_eq!(parse_generic("2025/8/11 22:30"), Some(at(2025, 8, 11, 22, 30, 0)));
        assert_eq!(parse_generic("25-08-2025 22:30"), Some(at(2025, 8, 25, 22, 30, 0)));
        assert_eq!(parse_generic("11.08.2025 22:30"), Some(at(2025, 8, 11, 22, 30, 0)));
    }

    #[test]
    fn test_generic_needs_year_and_day() {
        assert_eq!(parse_generic("Some random text with no date"), None);
        assert_eq!(parse_generic("2023 - 3:45"), None);
    }

    #[test]
    fn test_cascade_order() {
        let methods: Vec<ParseMethod> = CASCADE.iter().map(|(method, _)| *method).collect();
        assert_eq!(methods, vec![ParseMethod::Manual, ParseMethod::FormatTable, ParseMethod::Generic]);
    }
}
