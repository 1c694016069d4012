//! Calendar arithmetic for FPY windows.
//!
//! Weeks run Sunday through Saturday. Quarters are the usual calendar
//! quarters (Jan-Mar, Apr-Jun, Jul-Sep, Oct-Dec). Every function here works
//! on civil dates; the only place a time zone matters is turning an instant
//! into a civil date, and that goes through the configured [`TimePolicy`].

use std::fmt;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Local, Months, NaiveDate, NaiveDateTime, NaiveTime,
    Utc,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Smallest weekly window fetched for a quarter.
pub const MIN_QUARTER_WEEKS: u32 = 4;

/// Largest weekly window the backend will serve.
pub const MAX_QUARTER_WEEKS: u32 = 26;

/// How instants are mapped onto calendar days.
///
/// Week and quarter boundaries are civil-day boundaries, so two policies can
/// put the same instant in different weeks near midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimePolicy {
    /// The machine's local time zone
    #[default]
    Local,
    /// UTC
    Utc,
    /// A fixed offset in seconds east of UTC
    FixedOffset(i32),
}

impl TimePolicy {
    /// The calendar day `instant` falls on under this policy.
    #[must_use]
    pub fn civil_date(self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            Self::Local => instant.with_timezone(&Local).date_naive(),
            Self::Utc => instant.date_naive(),
            Self::FixedOffset(secs) => FixedOffset::east_opt(secs).map_or_else(
                || instant.date_naive(),
                |offset| instant.with_timezone(&offset).date_naive(),
            ),
        }
    }

    /// Today's date under this policy.
    #[must_use]
    pub fn today(self) -> NaiveDate {
        self.civil_date(Utc::now())
    }

    /// Whether a fixed offset is within ±24h.
    #[must_use]
    pub fn is_valid(self) -> bool {
        match self {
            Self::FixedOffset(secs) => FixedOffset::east_opt(secs).is_some(),
            Self::Local | Self::Utc => true,
        }
    }
}

impl fmt::Display for TimePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Utc => write!(f, "utc"),
            Self::FixedOffset(secs) => write!(f, "UTC{:+}s", secs),
        }
    }
}

/// The Sunday on or before `date`.
#[must_use]
pub fn sunday_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// A Sunday-to-Saturday week in civil time.
///
/// `start` is Sunday 00:00:00.000 and `end` is the following Saturday
/// 23:59:59.999.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl WeekRange {
    /// The week containing `date`.
    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        let start = sunday_start(date).and_time(NaiveTime::MIN);
        let end = start + Duration::days(7) - Duration::milliseconds(1);
        Self { start, end }
    }

    /// First day of the week (a Sunday).
    #[must_use]
    pub fn start_date(&self) -> NaiveDate {
        self.start.date()
    }

    /// Last day of the week (a Saturday).
    #[must_use]
    pub fn end_date(&self) -> NaiveDate {
        self.end.date()
    }

    /// Whether `moment` falls inside the week, both ends inclusive.
    #[must_use]
    pub fn contains(&self, moment: NaiveDateTime) -> bool {
        self.start <= moment && moment <= self.end
    }
}

impl fmt::Display for WeekRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.start_date(), self.end_date())
    }
}

/// Number of weeks a backward-walking fetch anchored at `anchor_week_start`
/// needs to reach back to `quarter_start`, plus one week of margin.
///
/// Always within [`MIN_QUARTER_WEEKS`, `MAX_QUARTER_WEEKS`].
#[must_use]
pub fn weeks_needed_to_cover_quarter(quarter_start: NaiveDate, anchor_week_start: NaiveDate) -> u32 {
    let days = (anchor_week_start - quarter_start).num_days().max(0);
    let weeks = (days + 6) / 7 + 1;
    let weeks = u32::try_from(weeks).unwrap_or(MAX_QUARTER_WEEKS);
    weeks.clamp(MIN_QUARTER_WEEKS, MAX_QUARTER_WEEKS)
}

/// Move the first-of-month of `date` by `offset` quarters.
///
/// The result is always the first day of a month, so it can be used directly
/// as a new quarter anchor.
pub fn shift_quarter(date: NaiveDate, offset: i32) -> Result<NaiveDate> {
    let first = date.with_day(1).expect("day 1 is always valid");
    let months = offset
        .unsigned_abs()
        .checked_mul(3)
        .map(Months::new)
        .ok_or_else(|| Error::invalid_date(format!("{date} shifted by {offset} quarters")))?;

    let shifted = if offset >= 0 {
        first.checked_add_months(months)
    } else {
        first.checked_sub_months(months)
    };
    shifted.ok_or_else(|| Error::invalid_date(format!("{date} shifted by {offset} quarters")))
}

/// One calendar quarter, plus the parameters needed to fetch its weeks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuarterDescriptor {
    /// Quarter number, 1 through 4
    pub index: u32,
    pub year: i32,
    /// First day of the quarter
    pub start_date: NaiveDate,
    /// Last day of the quarter
    pub end_date: NaiveDate,
    /// Sunday starting the week that contains `end_date`
    pub anchor_for_fetch: NaiveDate,
    /// Weeks to request so the fetch reaches back to `start_date`
    pub weeks_to_fetch: u32,
}

impl QuarterDescriptor {
    /// The quarter containing `date`.
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        let year = date.year();
        let quarter = date.month0() / 3;
        let first_month = quarter * 3 + 1;
        let last_month = first_month + 2;

        let start_date =
            NaiveDate::from_ymd_opt(year, first_month, 1).expect("day 1 is always valid");
        let end_date = if last_month == 12 {
            NaiveDate::from_ymd_opt(year, 12, 31).expect("December 31 is always valid")
        } else {
            NaiveDate::from_ymd_opt(year, last_month + 1, 1)
                .and_then(|d| d.pred_opt())
                .expect("last day of a month inside the year is always valid")
        };
        let anchor_for_fetch = sunday_start(end_date);

        Self {
            index: quarter + 1,
            year,
            start_date,
            end_date,
            anchor_for_fetch,
            weeks_to_fetch: weeks_needed_to_cover_quarter(start_date, anchor_for_fetch),
        }
    }

    /// Human-readable label, e.g. `Q1 2024`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("Q{} {}", self.index, self.year)
    }

    /// Whether `date` lies inside the quarter.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Whether the whole span `[start, end]` lies inside the quarter.
    #[must_use]
    pub fn covers(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= start && end <= self.end_date
    }
}

impl fmt::Display for QuarterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Calendar operations bound to one [`TimePolicy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalendarWindow {
    policy: TimePolicy,
}

impl CalendarWindow {
    #[must_use]
    pub const fn new(policy: TimePolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub const fn policy(&self) -> TimePolicy {
        self.policy
    }

    /// Today's date under the configured policy.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.policy.today()
    }

    /// The Sunday-anchored week containing `date`.
    #[must_use]
    pub fn week_range_of(&self, date: NaiveDate) -> WeekRange {
        WeekRange::containing(date)
    }

    /// The week containing `instant`, with the day decided by the policy.
    #[must_use]
    pub fn week_range_of_instant(&self, instant: DateTime<Utc>) -> WeekRange {
        WeekRange::containing(self.policy.civil_date(instant))
    }

    /// The quarter containing `date`.
    #[must_use]
    pub fn quarter_of(&self, date: NaiveDate) -> QuarterDescriptor {
        QuarterDescriptor::of(date)
    }

    /// The quarter containing `instant`, with the day decided by the policy.
    #[must_use]
    pub fn quarter_of_instant(&self, instant: DateTime<Utc>) -> QuarterDescriptor {
        QuarterDescriptor::of(self.policy.civil_date(instant))
    }

    /// Parse a `YYYY-MM-DD` date, or an RFC 3339 timestamp mapped to a
    /// calendar day through the policy.
    pub fn parse_date(&self, input: &str) -> Result<NaiveDate> {
        let trimmed = input.trim();
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Ok(date);
        }
        DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| self.policy.civil_date(dt.with_timezone(&Utc)))
            .map_err(|_| Error::invalid_date(input))
    }

    /// Parse `input`, substituting today when it is empty or unparsable.
    #[must_use]
    pub fn date_or_today(&self, input: &str) -> NaiveDate {
        if input.trim().is_empty() {
            return self.today();
        }
        self.parse_date(input).unwrap_or_else(|e| {
            warn!("{e}, using today instead");
            self.today()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Weekday};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_range_of_friday() {
        let cal = CalendarWindow::new(TimePolicy::Utc);
        let week = cal.week_range_of(ymd(2024, 3, 15));
        assert_eq!(week.start_date(), ymd(2024, 3, 10));
        assert_eq!(week.end_date(), ymd(2024, 3, 16));
        assert_eq!(week.to_string(), "2024-03-10 → 2024-03-16");
    }

    #[test]
    fn test_week_range_shape_for_every_day_of_a_year() {
        let mut day = ymd(2023, 12, 1);
        while day < ymd(2025, 2, 1) {
            let week = WeekRange::containing(day);
            assert_eq!(week.start.weekday(), Weekday::Sun);
            assert_eq!(week.end.weekday(), Weekday::Sat);
            assert_eq!(
                week.end - week.start,
                Duration::days(7) - Duration::milliseconds(1)
            );
            assert!(week.contains(day.and_time(NaiveTime::MIN)));
            assert!(week.contains(day.and_hms_milli_opt(23, 59, 59, 999).unwrap()));
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_sunday_is_its_own_week_start() {
        assert_eq!(sunday_start(ymd(2024, 3, 10)), ymd(2024, 3, 10));
        assert_eq!(sunday_start(ymd(2024, 3, 16)), ymd(2024, 3, 10));
        // Week straddling a year boundary
        assert_eq!(sunday_start(ymd(2025, 1, 1)), ymd(2024, 12, 29));
    }

    #[test]
    fn test_late_evening_west_of_utc() {
        // Saturday 23:30 at UTC-5 is already Sunday in UTC.
        let instant = Utc.with_ymd_and_hms(2024, 3, 17, 4, 30, 0).unwrap();

        let utc = CalendarWindow::new(TimePolicy::Utc).week_range_of_instant(instant);
        assert_eq!(utc.start_date(), ymd(2024, 3, 17));

        let west = CalendarWindow::new(TimePolicy::FixedOffset(-5 * 3600))
            .week_range_of_instant(instant);
        assert_eq!(west.start_date(), ymd(2024, 3, 10));
    }

    #[test]
    fn test_just_after_midnight_east_of_utc() {
        // Sunday 00:30 at UTC+2 is still Saturday in UTC.
        let instant = Utc.with_ymd_and_hms(2024, 3, 16, 22, 30, 0).unwrap();

        let utc = CalendarWindow::new(TimePolicy::Utc).week_range_of_instant(instant);
        assert_eq!(utc.start_date(), ymd(2024, 3, 10));

        let east = CalendarWindow::new(TimePolicy::FixedOffset(2 * 3600))
            .week_range_of_instant(instant);
        assert_eq!(east.start_date(), ymd(2024, 3, 17));
    }

    #[test]
    fn test_quarter_edge_depends_on_policy() {
        // 2024-03-31 23:30 at UTC-5
        let instant = Utc.with_ymd_and_hms(2024, 4, 1, 4, 30, 0).unwrap();
        let utc = CalendarWindow::new(TimePolicy::Utc).quarter_of_instant(instant);
        let west = CalendarWindow::new(TimePolicy::FixedOffset(-5 * 3600))
            .quarter_of_instant(instant);
        assert_eq!(utc.label(), "Q2 2024");
        assert_eq!(west.label(), "Q1 2024");
    }

    #[test]
    fn test_quarter_of_february() {
        let q = QuarterDescriptor::of(ymd(2024, 2, 10));
        assert_eq!(q.index, 1);
        assert_eq!(q.year, 2024);
        assert_eq!(q.start_date, ymd(2024, 1, 1));
        assert_eq!(q.end_date, ymd(2024, 3, 31));
        // 2024-03-31 is itself a Sunday
        assert_eq!(q.anchor_for_fetch, ymd(2024, 3, 31));
        assert_eq!(q.weeks_to_fetch, 14);
        assert_eq!(q.label(), "Q1 2024");
    }

    #[test]
    fn test_quarter_ends() {
        assert_eq!(QuarterDescriptor::of(ymd(2023, 5, 5)).end_date, ymd(2023, 6, 30));
        assert_eq!(QuarterDescriptor::of(ymd(2023, 8, 31)).end_date, ymd(2023, 9, 30));
        assert_eq!(QuarterDescriptor::of(ymd(2023, 11, 1)).end_date, ymd(2023, 12, 31));
        assert_eq!(QuarterDescriptor::of(ymd(2023, 12, 31)).start_date, ymd(2023, 10, 1));
    }

    #[test]
    fn test_quarter_contains_its_dates_and_spans_three_months() {
        let mut day = ymd(2023, 1, 1);
        while day <= ymd(2024, 12, 31) {
            let q = QuarterDescriptor::of(day);
            assert!(q.contains(day));
            assert_eq!(q.start_date.day(), 1);
            assert_eq!(q.start_date.checked_add_months(Months::new(3)).unwrap().pred_opt(), Some(q.end_date));
            assert!(q.anchor_for_fetch <= q.end_date);
            assert_eq!(q.anchor_for_fetch.weekday(), Weekday::Sun);
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_weeks_needed_bounds_and_monotonic() {
        let start = ymd(2024, 1, 1);
        let mut previous = 0;
        for gap in 0..400 {
            let weeks = weeks_needed_to_cover_quarter(start, start + Duration::days(gap));
            assert!((MIN_QUARTER_WEEKS..=MAX_QUARTER_WEEKS).contains(&weeks));
            assert!(weeks >= previous);
            previous = weeks;
        }
        // Anchor before the quarter start counts as no gap
        assert_eq!(
            weeks_needed_to_cover_quarter(start, start - Duration::days(30)),
            MIN_QUARTER_WEEKS
        );
    }

    #[test]
    fn test_weeks_needed_exact_values() {
        let start = ymd(2024, 1, 1);
        assert_eq!(weeks_needed_to_cover_quarter(start, ymd(2024, 1, 29)), 5);
        assert_eq!(weeks_needed_to_cover_quarter(start, ymd(2024, 1, 30)), 6);
        assert_eq!(weeks_needed_to_cover_quarter(start, ymd(2025, 1, 1)), 26);
    }

    #[test]
    fn test_shift_quarter() {
        assert_eq!(shift_quarter(ymd(2024, 2, 10), 1).unwrap(), ymd(2024, 5, 1));
        assert_eq!(shift_quarter(ymd(2024, 2, 10), -1).unwrap(), ymd(2023, 11, 1));
        assert_eq!(shift_quarter(ymd(2024, 2, 10), 0).unwrap(), ymd(2024, 2, 1));
        assert_eq!(shift_quarter(ymd(2024, 8, 31), 4).unwrap(), ymd(2025, 8, 1));
    }

    #[test]
    fn test_shift_quarter_round_trip_across_year() {
        let q4 = ymd(2023, 11, 20);
        let next = shift_quarter(q4, 1).unwrap();
        assert_eq!(QuarterDescriptor::of(next).label(), "Q1 2024");
        let back = shift_quarter(next, -1).unwrap();
        let original = QuarterDescriptor::of(q4);
        let round_tripped = QuarterDescriptor::of(back);
        assert_eq!(round_tripped.index, original.index);
        assert_eq!(round_tripped.year, original.year);
    }

    #[test]
    fn test_parse_date() {
        let cal = CalendarWindow::new(TimePolicy::Utc);
        assert_eq!(cal.parse_date("2024-03-15").unwrap(), ymd(2024, 3, 15));
        assert_eq!(
            cal.parse_date("2024-03-16T23:30:00-05:00").unwrap(),
            ymd(2024, 3, 17)
        );
        assert!(matches!(
            cal.parse_date("2024-02-30"),
            Err(Error::InvalidDate(_))
        ));
        assert!(matches!(cal.parse_date("yesterday"), Err(Error::InvalidDate(_))));
    }

    #[test]
    fn test_date_or_today_recovers() {
        let cal = CalendarWindow::new(TimePolicy::Utc);
        assert_eq!(cal.date_or_today("2024-03-15"), ymd(2024, 3, 15));
        let today = cal.today();
        let fallback = cal.date_or_today("not a date");
        // Allow for the test straddling midnight
        assert!(fallback == today || fallback == today.succ_opt().unwrap());
        let empty = cal.date_or_today("");
        assert!(empty == today || empty == today.succ_opt().unwrap());
    }

    #[test]
    fn test_time_policy_serde() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: TimePolicy,
        }
        let w: Wrapper = toml::from_str("policy = \"utc\"").unwrap();
        assert_eq!(w.policy, TimePolicy::Utc);
        let w: Wrapper = toml::from_str("policy = { fixed_offset = -18000 }").unwrap();
        assert_eq!(w.policy, TimePolicy::FixedOffset(-18000));
        assert!(!TimePolicy::FixedOffset(100_000).is_valid());
    }
}
