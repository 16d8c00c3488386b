//! Lenient date parsing for resume date strings.
//!
//! Resumes carry dates as display strings ("May 2025", "2019 - Present").
//! Anything that does not parse becomes `None`; callers record a warning.

use chrono::NaiveDate;

const OPEN_ENDED: &[&str] = &["present", "current", "now", "ongoing", "today"];

/// Parse a single date string.
#[must_use]
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    // Month precision: pin to the first day of the month.
    for fmt in ["%Y-%m-%d", "%b %Y-%d", "%B %Y-%d", "%m/%Y-%d"] {
        let padded = format!("{trimmed}-01");
        if let Ok(date) = NaiveDate::parse_from_str(&padded, fmt) {
            return Some(date);
        }
    }
    if trimmed.len() == 4 && trimmed.chars().all(|c| c.is_ascii_digit()) {
        let year: i32 = trimmed.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }
    None
}

/// True for "Present"-style open range markers.
#[must_use]
pub fn is_open_ended(input: &str) -> bool {
    let lower = input.trim().to_lowercase();
    OPEN_ENDED.contains(&lower.as_str())
}

/// Split a display range ("Jan 2020 - Present", "2015 to 2019") into its ends.
#[must_use]
pub fn split_range(input: &str) -> (Option<&str>, Option<&str>) {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return (None, None);
    }
    for sep in [" - ", " – ", " — ", " to ", "–", "—"] {
        if let Some((start, end)) = trimmed.split_once(sep) {
            return (non_empty(start), non_empty(end));
        }
    }
    // "2015-2019" style: only split a bare hyphen between two years.
    if let Some((start, end)) = trimmed.split_once('-') {
        let is_year = |s: &str| s.trim().len() == 4 && s.trim().chars().all(|c| c.is_ascii_digit());
        if is_year(start) && (is_year(end) || is_open_ended(end)) {
            return (non_empty(start), non_empty(end));
        }
    }
    (Some(trimmed), None)
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    if s.is_empty() { None } else { Some(s) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_parse_full_date() {
        assert_eq!(parse_date("2021-03-15"), ymd(2021, 3, 15));
    }

    #[test]
    fn test_parse_month_precision() {
        assert_eq!(parse_date("2021-03"), ymd(2021, 3, 1));
        assert_eq!(parse_date("May 2025"), ymd(2025, 5, 1));
        assert_eq!(parse_date("September 2019"), ymd(2019, 9, 1));
        assert_eq!(parse_date("04/2018"), ymd(2018, 4, 1));
    }

    #[test]
    fn test_parse_year_only() {
        assert_eq!(parse_date("2015"), ymd(2015, 1, 1));
    }

    #[test]
    fn test_unparseable_is_none() {
        assert_eq!(parse_date("Spring semester"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("Present"), None);
    }

    #[test]
    fn test_split_range() {
        assert_eq!(split_range("Jan 2020 - Present"), (Some("Jan 2020"), Some("Present")));
        assert_eq!(split_range("2015-2019"), (Some("2015"), Some("2019")));
        assert_eq!(split_range("2015 to 2019"), (Some("2015"), Some("2019")));
        assert_eq!(split_range("May 2025"), (Some("May 2025"), None));
        assert_eq!(split_range("2021-03-15"), (Some("2021-03-15"), None));
    }

    #[test]
    fn test_open_ended() {
        assert!(is_open_ended("Present"));
        assert!(is_open_ended(" current "));
        assert!(!is_open_ended("2019"));
    }
}
