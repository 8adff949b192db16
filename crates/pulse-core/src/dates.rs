//! Publish-date and scrape-timestamp normalization.
//!
//! Scraped article records carry dates in whatever shape the source site or
//! RSS feed emitted them. [`DateNormalizer`] runs an ordered cascade of
//! format attempts and degrades to [`DateOutcome::Unparseable`] on failure —
//! a typed value propagated as data, never an error.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use tracing::debug;

/// Days past "now" a publish date may sit before it is treated as garbage.
const FUTURE_SLACK_DAYS: u64 = 30;

// ── DateOutcome ───────────────────────────────────────────────────────────────

/// The result of normalizing one raw publish-date string.
///
/// `Unparseable` means "no valid calendar date could be derived" and is
/// distinct from an error: affected records stay in the pipeline and are
/// only excluded from date-bucketed aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOutcome {
    /// A canonical calendar date was derived.
    Parsed(NaiveDate),
    /// No valid calendar date could be derived.
    Unparseable,
}

impl DateOutcome {
    /// The parsed date, or `None` when unparseable.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            DateOutcome::Parsed(d) => Some(*d),
            DateOutcome::Unparseable => None,
        }
    }

    /// Whether a calendar date was derived.
    pub fn is_parsed(&self) -> bool {
        matches!(self, DateOutcome::Parsed(_))
    }
}

// ── DateNormalizer ────────────────────────────────────────────────────────────

/// Parses a single raw publish-date string into a canonical calendar date.
///
/// The cascade is ordered and first-match-wins (not best-match):
/// 1. null / empty / whitespace → `Unparseable`
/// 2. `YYYY-MM-DD` exact
/// 3. ISO datetime — date portion only
/// 4. RFC-2822-style (`Www, DD Mon YYYY ...`)
/// 5. long / short month name (`January 30, 2025` / `Jan 30, 2025`)
/// 6. `MM/DD/YYYY`
/// 7. year-less `Month DD at ...` — `Unparseable` unless a default year
///    was explicitly configured
/// 8. generic fallback formats
///
/// Any parsed date outside the plausible window (before `min_year`, or past
/// now + 30 days) is downgraded to `Unparseable` so that misparsed garbage
/// cannot silently corrupt aggregates.
pub struct DateNormalizer {
    min_year: i32,
    max_date: NaiveDate,
    default_year: Option<i32>,
    month_day_re: Regex,
}

impl DateNormalizer {
    /// Create a normalizer with the plausible window `[min_year-01-01, now + 30d]`.
    ///
    /// `default_year` opts in to resolving year-less `Month DD at ...` dates;
    /// leave it `None` to treat those as `Unparseable`.
    pub fn new(min_year: i32, default_year: Option<i32>) -> Self {
        let max_date = Utc::now().date_naive() + chrono::Days::new(FUTURE_SLACK_DAYS);
        Self::with_max_date(min_year, max_date, default_year)
    }

    /// Same as [`DateNormalizer::new`] but with an explicit upper bound,
    /// enabling deterministic tests.
    pub fn with_max_date(min_year: i32, max_date: NaiveDate, default_year: Option<i32>) -> Self {
        Self {
            min_year,
            max_date,
            default_year,
            month_day_re: Regex::new(r"^([A-Za-z]+)\s+(\d{1,2})\s+at\b").expect("regex is valid"),
        }
    }

    /// Normalize one raw publish-date string.
    ///
    /// Pure function; never panics and never returns an error — every
    /// failure mode degrades to [`DateOutcome::Unparseable`].
    pub fn normalize(&self, raw: Option<&str>) -> DateOutcome {
        let Some(raw) = raw else {
            return DateOutcome::Unparseable;
        };
        let s = raw.trim();
        if s.is_empty() {
            return DateOutcome::Unparseable;
        }

        // 2. Exact calendar date.
        if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return self.bounded(d, s);
        }

        // 3. ISO datetime — keep the literal date portion, no tz conversion.
        if let Some(d) = parse_iso_datetime(s) {
            return self.bounded(d, s);
        }

        // 4. RFC-2822-style, with or without a zone suffix.
        if let Some(d) = parse_rfc2822_like(s) {
            return self.bounded(d, s);
        }

        // 5. Long / short month name.
        for fmt in ["%B %d, %Y", "%b %d, %Y"] {
            if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
                return self.bounded(d, s);
            }
        }

        // 6. US slash format.
        if let Ok(d) = NaiveDate::parse_from_str(s, "%m/%d/%Y") {
            return self.bounded(d, s);
        }

        // 7. Year-less "Month DD at ..." — only with an explicit default year.
        if let Some(cap) = self.month_day_re.captures(s) {
            let Some(year) = self.default_year else {
                debug!("DateNormalizer: year-less date \"{}\" without default year", s);
                return DateOutcome::Unparseable;
            };
            let rebuilt = format!("{} {} {}", &cap[1], &cap[2], year);
            for fmt in ["%B %d %Y", "%b %d %Y"] {
                if let Ok(d) = NaiveDate::parse_from_str(&rebuilt, fmt) {
                    return self.bounded(d, s);
                }
            }
            return DateOutcome::Unparseable;
        }

        // 8. Generic fallback attempts.
        for fmt in ["%Y/%m/%d", "%d %B %Y", "%d %b %Y", "%B %d %Y", "%b %d %Y"] {
            if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
                return self.bounded(d, s);
            }
        }

        debug!("DateNormalizer: could not parse publish date \"{}\"", s);
        DateOutcome::Unparseable
    }

    /// Apply the plausible-window post-condition.
    fn bounded(&self, d: NaiveDate, raw: &str) -> DateOutcome {
        if d.year() < self.min_year || d > self.max_date {
            debug!(
                "DateNormalizer: \"{}\" parsed to {} outside plausible window, downgrading",
                raw, d
            );
            return DateOutcome::Unparseable;
        }
        DateOutcome::Parsed(d)
    }
}

// ── Format helpers ────────────────────────────────────────────────────────────

/// Parse an ISO datetime and return its literal date portion.
fn parse_iso_datetime(s: &str) -> Option<NaiveDate> {
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    // Offset / Z-suffix forms: take the date as written, not tz-shifted.
    let normalised = if let Some(stripped) = s.strip_suffix('Z') {
        format!("{}+00:00", stripped)
    } else {
        s.to_string()
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
        return Some(dt.naive_local().date());
    }
    None
}

/// Parse `Www, DD Mon YYYY [HH:MM:SS [zone]]` forms.
///
/// Feeds routinely emit a weekday that does not match the date, which strict
/// RFC 2822 parsing rejects, so after the strict attempt the weekday prefix
/// is stripped and only the date fields are parsed.
fn parse_rfc2822_like(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_local().date());
    }

    let (prefix, rest) = s.split_once(',')?;
    if prefix.len() != 3 || !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let rest = rest.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(rest, "%d %b %Y %H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(dt) = DateTime::parse_from_str(rest, "%d %b %Y %H:%M:%S %z") {
        return Some(dt.naive_local().date());
    }
    if let Ok(d) = NaiveDate::parse_from_str(rest, "%d %b %Y") {
        return Some(d);
    }
    None
}

// ── Scrape timestamps ─────────────────────────────────────────────────────────

/// Parse a `scraped_at` string into a UTC timestamp.
///
/// The scraper writes local-ISO timestamps (`datetime.now().isoformat()`),
/// but feeds occasionally smuggle in RFC 2822 or `Z`-suffixed forms, so the
/// cascade covers all three. Returns `None` for anything unrecognised —
/// a missing scrape time only disables hourly bucketing for that record.
pub fn parse_scrape_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let s = raw?.trim();
    if s.is_empty() {
        return None;
    }

    // Replace trailing 'Z' with '+00:00' for RFC 3339 compatibility.
    let normalised = if let Some(stripped) = s.strip_suffix('Z') {
        format!("{}+00:00", stripped)
    } else {
        s.to_string()
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // Naive forms are interpreted as UTC.
    const FMTS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];
    for fmt in FMTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    debug!("parse_scrape_timestamp: could not parse \"{}\"", s);
    None
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn normalizer() -> DateNormalizer {
        // Fixed upper bound keeps the window tests deterministic.
        DateNormalizer::with_max_date(2000, NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(), None)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ── Cascade steps ─────────────────────────────────────────────────────────

    #[test]
    fn test_normalize_none_and_empty() {
        let n = normalizer();
        assert_eq!(n.normalize(None), DateOutcome::Unparseable);
        assert_eq!(n.normalize(Some("")), DateOutcome::Unparseable);
        assert_eq!(n.normalize(Some("   ")), DateOutcome::Unparseable);
    }

    #[test]
    fn test_normalize_exact_calendar_date() {
        let n = normalizer();
        assert_eq!(
            n.normalize(Some("2025-01-30")),
            DateOutcome::Parsed(date(2025, 1, 30))
        );
    }

    #[test]
    fn test_normalize_iso_datetime_takes_date_portion() {
        let n = normalizer();
        assert_eq!(
            n.normalize(Some("2025-01-30T14:30:00")),
            DateOutcome::Parsed(date(2025, 1, 30))
        );
        assert_eq!(
            n.normalize(Some("2025-01-30T14:30:00.123456")),
            DateOutcome::Parsed(date(2025, 1, 30))
        );
    }

    #[test]
    fn test_normalize_iso_datetime_with_offset_keeps_literal_date() {
        let n = normalizer();
        // 00:30 at +02:00 is the previous day in UTC; the literal date wins.
        assert_eq!(
            n.normalize(Some("2025-01-30T00:30:00+02:00")),
            DateOutcome::Parsed(date(2025, 1, 30))
        );
        assert_eq!(
            n.normalize(Some("2025-01-30T14:30:00Z")),
            DateOutcome::Parsed(date(2025, 1, 30))
        );
    }

    #[test]
    fn test_normalize_rfc2822_without_zone() {
        let n = normalizer();
        assert_eq!(
            n.normalize(Some("Wed, 30 Jan 2025 14:30:00")),
            DateOutcome::Parsed(date(2025, 1, 30))
        );
    }

    #[test]
    fn test_normalize_rfc2822_with_zone() {
        let n = normalizer();
        assert_eq!(
            n.normalize(Some("Thu, 15 May 2025 08:00:00 GMT")),
            DateOutcome::Parsed(date(2025, 5, 15))
        );
        assert_eq!(
            n.normalize(Some("Thu, 15 May 2025 08:00:00 +0000")),
            DateOutcome::Parsed(date(2025, 5, 15))
        );
    }

    #[test]
    fn test_normalize_rfc2822_tolerates_wrong_weekday() {
        // 2025-01-30 is a Thursday; feeds still label it "Wed" sometimes.
        let n = normalizer();
        assert_eq!(
            n.normalize(Some("Wed, 30 Jan 2025 14:30:00 +0000")),
            DateOutcome::Parsed(date(2025, 1, 30))
        );
    }

    #[test]
    fn test_normalize_rfc2822_date_only() {
        let n = normalizer();
        assert_eq!(
            n.normalize(Some("Wed, 30 Jan 2025")),
            DateOutcome::Parsed(date(2025, 1, 30))
        );
    }

    #[test]
    fn test_normalize_long_month_name() {
        let n = normalizer();
        assert_eq!(
            n.normalize(Some("January 30, 2025")),
            DateOutcome::Parsed(date(2025, 1, 30))
        );
    }

    #[test]
    fn test_normalize_short_month_name() {
        let n = normalizer();
        assert_eq!(
            n.normalize(Some("Jan 30, 2025")),
            DateOutcome::Parsed(date(2025, 1, 30))
        );
    }

    #[test]
    fn test_normalize_us_slash_format() {
        let n = normalizer();
        assert_eq!(
            n.normalize(Some("01/30/2025")),
            DateOutcome::Parsed(date(2025, 1, 30))
        );
    }

    #[test]
    fn test_normalize_garbage_is_unparseable() {
        let n = normalizer();
        assert_eq!(n.normalize(Some("not a date")), DateOutcome::Unparseable);
        assert_eq!(n.normalize(Some("yesterday")), DateOutcome::Unparseable);
    }

    // ── Year-less dates ───────────────────────────────────────────────────────

    #[test]
    fn test_yearless_date_unparseable_by_default() {
        let n = normalizer();
        assert_eq!(
            n.normalize(Some("July 4 at 3:00 PM")),
            DateOutcome::Unparseable
        );
    }

    #[test]
    fn test_yearless_date_with_configured_default_year() {
        let n = DateNormalizer::with_max_date(
            2000,
            NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            Some(2025),
        );
        assert_eq!(
            n.normalize(Some("July 4 at 3:00 PM")),
            DateOutcome::Parsed(date(2025, 7, 4))
        );
        assert_eq!(
            n.normalize(Some("Jul 4 at 3:00 PM")),
            DateOutcome::Parsed(date(2025, 7, 4))
        );
    }

    // ── Plausible window ──────────────────────────────────────────────────────

    #[test]
    fn test_window_rejects_dates_before_min_year() {
        let n = normalizer();
        assert_eq!(n.normalize(Some("1999-12-31")), DateOutcome::Unparseable);
    }

    #[test]
    fn test_window_rejects_far_future_dates() {
        let n = normalizer();
        assert_eq!(n.normalize(Some("2031-01-01")), DateOutcome::Unparseable);
    }

    #[test]
    fn test_window_accepts_bounds() {
        let n = normalizer();
        assert_eq!(
            n.normalize(Some("2000-01-01")),
            DateOutcome::Parsed(date(2000, 1, 1))
        );
        assert_eq!(
            n.normalize(Some("2030-01-01")),
            DateOutcome::Parsed(date(2030, 1, 1))
        );
    }

    // ── DateOutcome ───────────────────────────────────────────────────────────

    #[test]
    fn test_date_outcome_accessors() {
        let parsed = DateOutcome::Parsed(date(2025, 8, 1));
        assert!(parsed.is_parsed());
        assert_eq!(parsed.as_date(), Some(date(2025, 8, 1)));
        assert!(!DateOutcome::Unparseable.is_parsed());
        assert_eq!(DateOutcome::Unparseable.as_date(), None);
    }

    // ── parse_scrape_timestamp ────────────────────────────────────────────────

    #[test]
    fn test_scrape_timestamp_local_iso() {
        let ts = parse_scrape_timestamp(Some("2025-08-01T10:30:00.123456")).unwrap();
        assert_eq!(ts.hour(), 10);
        assert_eq!(ts.minute(), 30);
    }

    #[test]
    fn test_scrape_timestamp_z_suffix() {
        let ts = parse_scrape_timestamp(Some("2025-08-01T10:30:00Z")).unwrap();
        assert_eq!(ts.hour(), 10);
    }

    #[test]
    fn test_scrape_timestamp_with_offset_converts_to_utc() {
        let ts = parse_scrape_timestamp(Some("2025-08-01T12:00:00+02:00")).unwrap();
        assert_eq!(ts.hour(), 10);
    }

    #[test]
    fn test_scrape_timestamp_missing_or_garbage() {
        assert!(parse_scrape_timestamp(None).is_none());
        assert!(parse_scrape_timestamp(Some("")).is_none());
        assert!(parse_scrape_timestamp(Some("not-a-timestamp")).is_none());
    }
}
