// src/resolver.rs
//
// Pure schedule resolution: one (employee, date) in, one concrete expected
// day out. Precedence, highest first:
//
//   1. an assigned shift for the exact date (flexible shifts enforce nothing)
//   2. the employee's department schedule, if flexible
//   3. the weekday's override (day-off beats times)
//   4. default weekend day-off when no override covers Saturday/Sunday
//   5. the schedule's base times
//
// Missing configuration never fails resolution: an assignment whose shift
// was deleted falls through to the department schedule, and a department
// with no schedule resolves as an unscheduled day-off.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::schedule::{DayOverride, DepartmentSchedule, DepartmentShift};

/// The concrete expectation for one employee on one calendar date after all
/// precedence rules have been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDay {
    pub date: NaiveDate,
    /// No attendance expected; any clock events are extra, never anomalous.
    pub day_off: bool,
    /// Times are tracked but never enforced.
    pub flexible: bool,
    pub entry_time: Option<NaiveTime>,
    pub exit_time: Option<NaiveTime>,
    pub exit_time_morning: Option<NaiveTime>,
    pub entry_time_afternoon: Option<NaiveTime>,
    pub tolerance_minutes: u32,
}

impl ResolvedDay {
    pub fn day_off(date: NaiveDate) -> Self {
        Self {
            date,
            day_off: true,
            flexible: false,
            entry_time: None,
            exit_time: None,
            exit_time_morning: None,
            entry_time_afternoon: None,
            tolerance_minutes: 0,
        }
    }

    pub fn flexible(date: NaiveDate) -> Self {
        Self {
            date,
            day_off: false,
            flexible: true,
            entry_time: None,
            exit_time: None,
            exit_time_morning: None,
            entry_time_afternoon: None,
            tolerance_minutes: 0,
        }
    }

    /// A split-shift day carries both a morning end and an afternoon start.
    pub fn is_split(&self) -> bool {
        self.exit_time_morning.is_some() && self.entry_time_afternoon.is_some()
    }

    /// Whether entry/exit times are to be enforced against clock events.
    pub fn is_enforced(&self) -> bool {
        !self.day_off && !self.flexible
    }

    fn from_shift(date: NaiveDate, shift: &DepartmentShift) -> Self {
        if shift.flexible {
            return Self::flexible(date);
        }
        Self {
            date,
            day_off: false,
            flexible: false,
            entry_time: Some(shift.entry_time),
            exit_time: Some(shift.exit_time),
            exit_time_morning: shift.exit_time_morning,
            entry_time_afternoon: shift.entry_time_afternoon,
            tolerance_minutes: shift.tolerance_minutes,
        }
    }

    fn from_schedule(date: NaiveDate, schedule: &DepartmentSchedule) -> Self {
        Self {
            date,
            day_off: false,
            flexible: false,
            entry_time: Some(schedule.entry_time),
            exit_time: Some(schedule.exit_time),
            exit_time_morning: None,
            entry_time_afternoon: None,
            tolerance_minutes: schedule.tolerance_minutes,
        }
    }

    /// Override times win field by field; anything absent falls back to the
    /// schedule base. Split-segment times only ever come from the override.
    fn from_override(
        date: NaiveDate,
        schedule: &DepartmentSchedule,
        day_override: &DayOverride,
    ) -> Self {
        Self {
            date,
            day_off: false,
            flexible: false,
            entry_time: Some(day_override.entry_time.unwrap_or(schedule.entry_time)),
            exit_time: Some(day_override.exit_time.unwrap_or(schedule.exit_time)),
            exit_time_morning: day_override.exit_time_morning,
            entry_time_afternoon: day_override.entry_time_afternoon,
            tolerance_minutes: day_override
                .tolerance_minutes
                .unwrap_or(schedule.tolerance_minutes),
        }
    }
}

/// Resolves the expected day for `date`.
///
/// `assigned_shift` is the shift behind a `ShiftAssignment` for this exact
/// date, already dereferenced by the caller; pass `None` both when no
/// assignment exists and when the assigned shift has since been deleted, so
/// resolution falls through to the department default either way.
pub fn resolve_day(
    date: NaiveDate,
    assigned_shift: Option<&DepartmentShift>,
    schedule: Option<&DepartmentSchedule>,
) -> ResolvedDay {
    if let Some(shift) = assigned_shift {
        return ResolvedDay::from_shift(date, shift);
    }

    let Some(schedule) = schedule else {
        // Unscheduled is an expected administrative state, not a defect.
        return ResolvedDay::day_off(date);
    };

    if schedule.flexible {
        return ResolvedDay::flexible(date);
    }

    let weekday = date.weekday();
    if let Some(day_override) = schedule.overrides.for_weekday(weekday) {
        if day_override.day_off {
            return ResolvedDay::day_off(date);
        }
        return ResolvedDay::from_override(date, schedule, day_override);
    }

    if weekday == Weekday::Sat || weekday == Weekday::Sun {
        return ResolvedDay::day_off(date);
    }

    ResolvedDay::from_schedule(date, schedule)
}
