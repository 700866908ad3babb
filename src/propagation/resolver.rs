//! Constraint resolution for a single dependency edge.
//!
//! | Relation | Required dependent start |
//! |----------|--------------------------|
//! | FS | `origin.end + lag` |
//! | SS | `origin.start + lag` |
//! | FF | `(origin.end + lag) - duration` |
//! | SF | `(origin.start + lag) - duration` |
//!
//! Lag is wall-clock time added before the result is snapped to working
//! time; `- duration` walks back through working time on the calendar.

use chrono::NaiveDateTime;

use crate::error::{PropagationError, Result};
use crate::models::{Lag, OriginAnchor, RelationKind, WorkingCalendar};

/// Computes the earliest start the dependent task may have.
///
/// # Returns
/// `Ok(None)` when the origin date the relation reads is missing.
///
/// # Errors
/// `DateOutOfRange` when the lag or the calendar walk leaves chrono's
/// date range.
pub fn resolve(
    relation: RelationKind,
    origin_start: Option<NaiveDateTime>,
    origin_end: Option<NaiveDateTime>,
    dependent_hours: f64,
    lag: Lag,
    calendar: &WorkingCalendar,
) -> Result<Option<NaiveDateTime>> {
    let anchor = match relation.origin_anchor() {
        OriginAnchor::Start => origin_start,
        OriginAnchor::End => origin_end,
    };
    let Some(anchor) = anchor else {
        return Ok(None);
    };

    let offset = lag
        .as_delta()
        .and_then(|delta| anchor.checked_add_signed(delta))
        .ok_or_else(|| {
            PropagationError::DateOutOfRange(format!(
                "{anchor} shifted by {} minutes",
                lag.num_minutes()
            ))
        })?;
    let unsnapped = if relation.constrains_end() {
        calendar.subtract_working_hours(offset, dependent_hours)?
    } else {
        offset
    };
    calendar.next_working_time(unsnapped).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn cal() -> WorkingCalendar {
        WorkingCalendar::standard("std")
    }

    // Origin spans Mon 08:00 – Wed 17:00.
    fn run(relation: RelationKind, hours: f64, lag: Lag) -> Option<NaiveDateTime> {
        resolve(relation, Some(at(1, 8)), Some(at(3, 17)), hours, lag, &cal()).unwrap()
    }

    #[test]
    fn test_finish_to_start() {
        assert_eq!(run(RelationKind::FinishToStart, 16.0, Lag::ZERO), Some(at(4, 8)));
    }

    #[test]
    fn test_finish_to_start_lag_over_weekend() {
        // Wed 17:00 + 3 days = Sat 17:00, snapped to Monday
        assert_eq!(run(RelationKind::FinishToStart, 8.0, Lag::days(3)), Some(at(8, 8)));
    }

    #[test]
    fn test_finish_to_start_lead() {
        // Wed 17:00 - 4h = Wed 13:00
        assert_eq!(run(RelationKind::FinishToStart, 8.0, Lag::hours(-4)), Some(at(3, 13)));
    }

    #[test]
    fn test_start_to_start() {
        assert_eq!(run(RelationKind::StartToStart, 8.0, Lag::ZERO), Some(at(1, 8)));
        assert_eq!(run(RelationKind::StartToStart, 8.0, Lag::days(1)), Some(at(2, 8)));
    }

    #[test]
    fn test_finish_to_finish() {
        // Must end Wed 17:00 with 8h of work: start Wed 08:00
        assert_eq!(run(RelationKind::FinishToFinish, 8.0, Lag::ZERO), Some(at(3, 8)));
    }

    #[test]
    fn test_start_to_finish() {
        // Must end Mon 08:00 → Fri 17:00 previous week; 4h back = Fri 13:00
        let expected = NaiveDate::from_ymd_opt(2023, 12, 29)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap();
        assert_eq!(run(RelationKind::StartToFinish, 4.0, Lag::ZERO), Some(expected));
    }

    #[test]
    fn test_zero_duration_finish_relation() {
        // Milestone dependent: required end snapped as its start
        assert_eq!(run(RelationKind::FinishToFinish, 0.0, Lag::ZERO), Some(at(4, 8)));
    }

    #[test]
    fn test_lag_out_of_range() {
        for minutes in [9_000_000_000_000_000, i64::MIN, 6_000_000_000_000] {
            let result = resolve(
                RelationKind::FinishToStart,
                Some(at(1, 8)),
                Some(at(3, 17)),
                8.0,
                Lag::minutes(minutes),
                &cal(),
            );
            assert!(
                matches!(result, Err(PropagationError::DateOutOfRange(_))),
                "{minutes}: {result:?}"
            );
        }
    }

    #[test]
    fn test_missing_anchor() {
        let result = resolve(
            RelationKind::FinishToStart,
            Some(at(1, 8)),
            None,
            8.0,
            Lag::ZERO,
            &cal(),
        )
        .unwrap();
        assert!(result.is_none());

        // SS only reads the start
        let result = resolve(
            RelationKind::StartToStart,
            Some(at(1, 8)),
            None,
            8.0,
            Lag::ZERO,
            &cal(),
        )
        .unwrap();
        assert_eq!(result, Some(at(1, 8)));
    }
}
