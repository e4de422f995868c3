use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::{InvoiceError, Result};

/// Which span of tracked time an invoice covers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PeriodSelection {
    /// A whole tracking week, `offset` weeks back from the reference week.
    Week(u32),
    /// A calendar month (1-12) of the reference year.
    Month(u32),
}

impl Default for PeriodSelection {
    fn default() -> Self {
        PeriodSelection::Week(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodOptions {
    pub selection: PeriodSelection,
    /// Percentage surcharge on tracked durations (`-r`), e.g. 15 for +15%.
    pub surcharge_percent: Option<f64>,
    /// Explicit issue date; the current day otherwise.
    pub issue_date: Option<NaiveDate>,
}

/// A fully resolved invoicing period plus the issue-date bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPeriod {
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Displayed week number; `None` for calendar-month periods.
    pub week: Option<u32>,
    pub date: NaiveDate,
    pub due: NaiveDate,
    pub year: i32,
    /// Applied to raw tracked durations before minute rounding.
    pub multiplier: f64,
}

/// Resolves the selected period against `reference`.
///
/// Week mode keeps the original tool's Sunday-indexed day arithmetic: `from`
/// sits at day index `-7*offset - 1` of the reference week (a Saturday) and
/// `to` is six days later. The displayed week number is the ISO week of
/// `from` plus one; that offset-by-one convention is deliberate.
pub fn resolve_period(options: &PeriodOptions, reference: NaiveDate) -> Result<ResolvedPeriod> {
    let (from, to, week) = match options.selection {
        PeriodSelection::Week(offset) => week_range(reference, offset),
        PeriodSelection::Month(month) => month_range(reference, month)?,
    };
    let date = options.issue_date.unwrap_or(reference);
    let due = shift_month(date, 1);
    let multiplier = 1.0 + options.surcharge_percent.unwrap_or(0.0) / 100.0;
    Ok(ResolvedPeriod {
        from,
        to,
        week,
        date,
        due,
        year: date.year(),
        multiplier,
    })
}

fn week_range(reference: NaiveDate, offset: u32) -> (NaiveDate, NaiveDate, Option<u32>) {
    let week_start =
        reference - Duration::days(reference.weekday().num_days_from_sunday() as i64);
    let from = week_start + Duration::days(-7 * offset as i64 - 1);
    let to = from + Duration::days(6);
    let week = from.iso_week().week() + 1;
    (from, to, Some(week))
}

fn month_range(reference: NaiveDate, month: u32) -> Result<(NaiveDate, NaiveDate, Option<u32>)> {
    if !(1..=12).contains(&month) {
        return Err(InvoiceError::InvalidArgument(format!(
            "please provide a month number between 1 and 12, got {month}"
        )));
    }
    let from = NaiveDate::from_ymd_opt(reference.year(), month, 1).unwrap();
    let to = from
        .with_day(days_in_month(reference.year(), month))
        .unwrap();
    Ok((from, to, None))
}

/// Adds calendar months, clamping the day to the target month's length.
pub fn shift_month(date: NaiveDate, months: i32) -> NaiveDate {
    let mut year = date.year();
    let mut month = date.month() as i32 + months;
    let mut day = date.day();
    while month > 12 {
        month -= 12;
        year += 1;
    }
    while month < 1 {
        month += 12;
        year -= 1;
    }
    day = day.min(days_in_month(year, month as u32));
    NaiveDate::from_ymd_opt(year, month as u32, day).unwrap()
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };
    let first_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, month, 28).unwrap());
    (first_next - Duration::days(1)).day()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn week_options(offset: u32) -> PeriodOptions {
        PeriodOptions {
            selection: PeriodSelection::Week(offset),
            ..PeriodOptions::default()
        }
    }

    #[test]
    fn week_period_spans_exactly_seven_days() {
        let reference = date(2026, 8, 6);
        for offset in 0..10 {
            let period = resolve_period(&week_options(offset), reference).expect("period");
            assert_eq!(period.to - period.from, Duration::days(6));
            assert_eq!(period.from.weekday(), Weekday::Sat);
        }
    }

    #[test]
    fn default_selection_is_the_previous_week() {
        // Thursday 2026-08-06: week starts Sunday 2026-08-02, so the default
        // offset of one lands on Sat 2026-07-25 .. Fri 2026-07-31.
        let period =
            resolve_period(&PeriodOptions::default(), date(2026, 8, 6)).expect("period");
        assert_eq!(period.from, date(2026, 7, 25));
        assert_eq!(period.to, date(2026, 7, 31));
    }

    #[test]
    fn week_number_is_iso_week_of_from_plus_one() {
        // 2022-12-31 is a Saturday in ISO week 52 of 2022; the ledger displays 53.
        let period = resolve_period(&week_options(1), date(2023, 1, 12)).expect("period");
        assert_eq!(period.from, date(2022, 12, 31));
        assert_eq!(period.week, Some(53));
    }

    #[test]
    fn month_period_covers_the_whole_calendar_month() {
        let options = PeriodOptions {
            selection: PeriodSelection::Month(2),
            ..PeriodOptions::default()
        };
        let period = resolve_period(&options, date(2026, 8, 6)).expect("period");
        assert_eq!(period.from, date(2026, 2, 1));
        assert_eq!(period.to, date(2026, 2, 28));
        assert_eq!(period.week, None);
    }

    #[test]
    fn month_period_honours_leap_years() {
        let options = PeriodOptions {
            selection: PeriodSelection::Month(2),
            ..PeriodOptions::default()
        };
        let period = resolve_period(&options, date(2024, 6, 1)).expect("period");
        assert_eq!(period.to, date(2024, 2, 29));
    }

    #[test]
    fn month_out_of_range_is_an_invalid_argument() {
        let options = PeriodOptions {
            selection: PeriodSelection::Month(13),
            ..PeriodOptions::default()
        };
        let err = resolve_period(&options, date(2026, 8, 6)).expect_err("13 is not a month");
        assert!(matches!(err, InvoiceError::InvalidArgument(_)));
    }

    #[test]
    fn due_date_is_one_month_later_with_end_of_month_clamping() {
        let options = PeriodOptions {
            selection: PeriodSelection::Month(1),
            issue_date: Some(date(2026, 1, 31)),
            ..PeriodOptions::default()
        };
        let period = resolve_period(&options, date(2026, 8, 6)).expect("period");
        assert_eq!(period.date, date(2026, 1, 31));
        assert_eq!(period.due, date(2026, 2, 28));
        assert_eq!(period.year, 2026);
    }

    #[test]
    fn issue_date_defaults_to_the_reference() {
        let period = resolve_period(&week_options(1), date(2026, 8, 6)).expect("period");
        assert_eq!(period.date, date(2026, 8, 6));
        assert_eq!(period.due, date(2026, 9, 6));
    }

    #[test]
    fn surcharge_percent_becomes_a_multiplier() {
        let options = PeriodOptions {
            surcharge_percent: Some(15.0),
            ..PeriodOptions::default()
        };
        let period = resolve_period(&options, date(2026, 8, 6)).expect("period");
        assert!((period.multiplier - 1.15).abs() < f64::EPSILON);

        let plain = resolve_period(&PeriodOptions::default(), date(2026, 8, 6)).expect("period");
        assert!((plain.multiplier - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn shift_month_wraps_year_boundaries() {
        assert_eq!(shift_month(date(2025, 12, 15), 1), date(2026, 1, 15));
        assert_eq!(shift_month(date(2026, 1, 15), -1), date(2025, 12, 15));
    }
}
