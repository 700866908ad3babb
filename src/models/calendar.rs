//! Working calendar model.
//!
//! Defines which days and hours count as working time: a set of working
//! weekdays, a morning and an afternoon shift, and optional holidays
//! (working weekdays removed from the calendar).
//!
//! # Time Model
//! Timestamps are naive local date-times. Shifts are half-open
//! `[start, end)` when rolling forward and `(start, end]` when rolling
//! backward, so an instant sitting exactly on a shift end belongs to the
//! *next* shift going forward and to the *current* one going backward.
//! This keeps `add_working_hours` and `subtract_working_hours` mirror
//! images of each other.
//!
//! # Lag
//! Calendar arithmetic never sees lag: callers add a wall-clock offset
//! first and snap the result with [`WorkingCalendar::next_working_time`].

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{PropagationError, Result};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Largest duration, in working hours, any arithmetic accepts.
pub const MAX_DURATION_HOURS: f64 = 1_000_000.0;

/// A daily working interval.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Shift {
    /// Shift start (inclusive).
    pub start: NaiveTime,
    /// Shift end (exclusive going forward).
    pub end: NaiveTime,
}

impl Shift {
    /// Creates a shift from two times of day.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Creates a shift on whole hours, e.g. `Shift::hours(8, 12)`.
    ///
    /// Out-of-range hours collapse to midnight, which `validate` rejects.
    pub fn hours(start_hour: u32, end_hour: u32) -> Self {
        Self::new(whole_hour(start_hour), whole_hour(end_hour))
    }

    /// Shift length in seconds.
    #[inline]
    pub fn seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }
}

fn whole_hour(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Working-time calendar used for all duration arithmetic in a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkingCalendar {
    /// Calendar identifier.
    pub id: String,
    /// Weekdays that count as working days.
    pub working_days: Vec<Weekday>,
    /// Morning shift.
    pub morning: Shift,
    /// Afternoon shift.
    pub afternoon: Shift,
    /// Dates removed from the working-day set.
    #[serde(default)]
    pub holidays: BTreeSet<NaiveDate>,
}

impl WorkingCalendar {
    /// Creates a Monday–Friday calendar with 08:00–12:00 and 13:00–17:00
    /// shifts (8 hours per day).
    pub fn standard(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            working_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            morning: Shift::hours(8, 12),
            afternoon: Shift::hours(13, 17),
            holidays: BTreeSet::new(),
        }
    }

    /// Replaces the working weekdays.
    pub fn with_working_days(mut self, days: Vec<Weekday>) -> Self {
        self.working_days = days;
        self
    }

    /// Replaces both shifts.
    pub fn with_shifts(mut self, morning: Shift, afternoon: Shift) -> Self {
        self.morning = morning;
        self.afternoon = afternoon;
        self
    }

    /// Adds a holiday.
    pub fn with_holiday(mut self, date: NaiveDate) -> Self {
        self.holidays.insert(date);
        self
    }

    /// Both shifts in chronological order.
    #[inline]
    pub fn shifts(&self) -> [Shift; 2] {
        [self.morning, self.afternoon]
    }

    /// Working hours per working day (sum of both shifts).
    pub fn hours_per_day(&self) -> f64 {
        self.seconds_per_day() as f64 / SECONDS_PER_HOUR
    }

    fn seconds_per_day(&self) -> i64 {
        self.shifts().iter().map(Shift::seconds).sum()
    }

    /// Checks the calendar invariants.
    ///
    /// # Errors
    /// `InvalidCalendar` when a shift is empty or inverted, the shifts
    /// overlap, the day has no working time, or no weekday is working.
    pub fn validate(&self) -> Result<()> {
        for (label, shift) in [("morning", self.morning), ("afternoon", self.afternoon)] {
            if shift.end <= shift.start {
                return Err(self.invalid(format!(
                    "{label} shift ends at {} which is not after its start {}",
                    shift.end, shift.start
                )));
            }
        }
        if self.afternoon.start < self.morning.end {
            return Err(self.invalid("afternoon shift starts before the morning shift ends"));
        }
        if self.seconds_per_day() <= 0 {
            return Err(self.invalid("hours per day must be positive"));
        }
        if self.working_days.is_empty() {
            return Err(self.invalid("no working weekdays"));
        }
        Ok(())
    }

    fn invalid(&self, reason: impl AsRef<str>) -> PropagationError {
        PropagationError::InvalidCalendar(format!("calendar '{}': {}", self.id, reason.as_ref()))
    }

    /// Whether `date` is a working day.
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        self.working_days.contains(&date.weekday()) && !self.holidays.contains(&date)
    }

    // Every 7-day window holds a working weekday; each holiday can cancel one.
    fn search_horizon(&self) -> usize {
        7 * (self.holidays.len() + 1)
    }

    /// Rolls `date` forward to the nearest working day (inclusive).
    pub fn next_working_day(&self, date: NaiveDate) -> Result<NaiveDate> {
        let mut day = date;
        for _ in 0..self.search_horizon() {
            if self.is_working_day(day) {
                return Ok(day);
            }
            day = day_after(day)?;
        }
        Err(self.invalid(format!("no working day on or after {date}")))
    }

    /// Rolls `date` backward to the nearest working day (inclusive).
    pub fn previous_working_day(&self, date: NaiveDate) -> Result<NaiveDate> {
        let mut day = date;
        for _ in 0..self.search_horizon() {
            if self.is_working_day(day) {
                return Ok(day);
            }
            day = day_before(day)?;
        }
        Err(self.invalid(format!("no working day on or before {date}")))
    }

    /// Morning shift start of the first working day strictly after `date`.
    pub fn start_of_next_working_day(&self, date: NaiveDate) -> Result<NaiveDateTime> {
        let day = self.next_working_day(day_after(date)?)?;
        Ok(day.and_time(self.morning.start))
    }

    /// Earliest working instant at or after `at`.
    ///
    /// An instant on a shift end is not working time: 17:00 on a
    /// Wednesday snaps to 08:00 on Thursday with the standard calendar.
    pub fn next_working_time(&self, at: NaiveDateTime) -> Result<NaiveDateTime> {
        let (day, time) = (at.date(), at.time());
        if self.is_working_day(day) {
            if let Some(shift) = self.shifts().into_iter().find(|s| time < s.end) {
                return Ok(day.and_time(time.max(shift.start)));
            }
        }
        let next = self.next_working_day(day_after(day)?)?;
        Ok(next.and_time(self.morning.start))
    }

    /// Latest working instant at or before `at`, treating shift ends as
    /// reachable.
    pub fn previous_working_time(&self, at: NaiveDateTime) -> Result<NaiveDateTime> {
        let (day, time) = (at.date(), at.time());
        if self.is_working_day(day) {
            if let Some(shift) = self.shifts().into_iter().rev().find(|s| time > s.start) {
                return Ok(day.and_time(time.min(shift.end)));
            }
        }
        let previous = self.previous_working_day(day_before(day)?)?;
        Ok(previous.and_time(self.afternoon.end))
    }

    /// Advances `start` by `hours` of working time.
    ///
    /// Zero hours returns `start` unchanged, even on a non-working day.
    ///
    /// # Errors
    /// `InvalidDuration` for negative or non-finite hours,
    /// `InvalidCalendar` if the calendar fails [`validate`](Self::validate).
    pub fn add_working_hours(&self, start: NaiveDateTime, hours: f64) -> Result<NaiveDateTime> {
        let mut remaining = duration_seconds(hours)?;
        if remaining == 0 {
            return Ok(start);
        }
        self.validate()?;

        let mut cursor = self.next_working_time(start)?;
        loop {
            let time = cursor.time();
            let shift = self
                .shifts()
                .into_iter()
                .find(|s| s.start <= time && time < s.end)
                .ok_or_else(|| self.invalid(format!("{cursor} is outside every shift")))?;
            let shift_end = cursor.date().and_time(shift.end);
            let available = (shift_end - cursor).num_seconds();
            if remaining <= available {
                return Ok(cursor + TimeDelta::seconds(remaining));
            }
            remaining -= available;
            cursor = self.next_working_time(shift_end)?;
        }
    }

    /// Moves `end` back by `hours` of working time.
    ///
    /// Mirror of [`add_working_hours`](Self::add_working_hours): for a
    /// working-time `end`, `add_working_hours(subtract_working_hours(end, h), h) == end`.
    pub fn subtract_working_hours(&self, end: NaiveDateTime, hours: f64) -> Result<NaiveDateTime> {
        let mut remaining = duration_seconds(hours)?;
        if remaining == 0 {
            return Ok(end);
        }
        self.validate()?;

        let mut cursor = self.previous_working_time(end)?;
        loop {
            let time = cursor.time();
            let shift = self
                .shifts()
                .into_iter()
                .rev()
                .find(|s| s.start < time && time <= s.end)
                .ok_or_else(|| self.invalid(format!("{cursor} is outside every shift")))?;
            let shift_start = cursor.date().and_time(shift.start);
            let available = (cursor - shift_start).num_seconds();
            if remaining <= available {
                return Ok(cursor - TimeDelta::seconds(remaining));
            }
            remaining -= available;
            cursor = self.previous_working_time(shift_start)?;
        }
    }

    /// Working hours inside `[start, end)`.
    pub fn working_hours_between(&self, start: NaiveDateTime, end: NaiveDateTime) -> f64 {
        if end <= start {
            return 0.0;
        }
        let mut seconds = 0i64;
        let mut day = start.date();
        while day <= end.date() {
            if self.is_working_day(day) {
                for shift in self.shifts() {
                    let from = day.and_time(shift.start).max(start);
                    let to = day.and_time(shift.end).min(end);
                    if to > from {
                        seconds += (to - from).num_seconds();
                    }
                }
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        seconds as f64 / SECONDS_PER_HOUR
    }
}

fn day_after(day: NaiveDate) -> Result<NaiveDate> {
    day.succ_opt()
        .ok_or_else(|| PropagationError::DateOutOfRange(format!("no day after {day}")))
}

fn day_before(day: NaiveDate) -> Result<NaiveDate> {
    day.pred_opt()
        .ok_or_else(|| PropagationError::DateOutOfRange(format!("no day before {day}")))
}

/// Converts an hour count to whole seconds, rejecting negative,
/// non-finite, and oversized values.
fn duration_seconds(hours: f64) -> Result<i64> {
    if !hours.is_finite() || !(0.0..=MAX_DURATION_HOURS).contains(&hours) {
        return Err(PropagationError::InvalidDuration {
            subject: "working-time arithmetic".into(),
            hours,
        });
    }
    Ok((hours * SECONDS_PER_HOUR).round() as i64)
}
