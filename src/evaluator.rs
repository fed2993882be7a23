// src/evaluator.rs
//
// Attendance evaluation: pairs one day's clock events into worked segments
// and checks them against the resolved schedule. Pure; facts depend only on
// the resolved day and the events themselves, never on wall-clock time, and
// are recomputed on every read.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::resolver::ResolvedDay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockEventKind {
    Entry,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// A single timestamped entry or exit punch. Immutable once recorded except
/// through an approved adjustment request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockEvent {
    pub id: String,
    pub employee_id: String,
    /// The employee's department when the punch was recorded.
    pub department: String,
    pub kind: ClockEventKind,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

/// One entry punch and, when the day is well formed, its closing exit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub entry: ClockEvent,
    pub exit: Option<ClockEvent>,
}

impl Segment {
    fn worked_seconds(&self) -> i64 {
        // An open segment contributes nothing; it is surfaced through
        // `is_complete` instead.
        match &self.exit {
            Some(exit) => (exit.timestamp - self.entry.timestamp).num_seconds(),
            None => 0,
        }
    }
}

/// Everything the surrounding surfaces need to display about one employee
/// day. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceDayFacts {
    pub date: chrono::NaiveDate,
    pub resolved: ResolvedDay,
    pub events: Vec<ClockEvent>,
    pub segments: Vec<Segment>,
    pub is_late: bool,
    pub is_early_departure: bool,
    pub is_complete: bool,
    /// Sum of closed segments, in hours, two decimal places.
    pub worked_hours: Decimal,
}

/// Evaluates one day's ordered clock events against the resolved schedule.
pub fn evaluate(resolved: &ResolvedDay, events: &[ClockEvent]) -> AttendanceDayFacts {
    let mut events: Vec<ClockEvent> = events.to_vec();
    events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));

    let (segments, orphan_exits) = pair_segments(&events);

    let worked_seconds: i64 = segments.iter().map(Segment::worked_seconds).sum();
    let worked_hours = (Decimal::from(worked_seconds) / dec!(3600)).round_dp(2);

    let every_entry_closed = segments.iter().all(|segment| segment.exit.is_some());
    let is_complete = if resolved.is_enforced() {
        // A scheduled day with no punches at all is an absence, not a
        // completed day.
        !events.is_empty() && every_entry_closed && orphan_exits == 0
    } else {
        every_entry_closed && orphan_exits == 0
    };

    let (is_late, is_early_departure) = if resolved.is_enforced() {
        (late_on_first_entry(resolved, &events), early_on_last_exit(resolved, &events))
    } else {
        (false, false)
    };

    AttendanceDayFacts {
        date: resolved.date,
        resolved: resolved.clone(),
        events,
        segments,
        is_late,
        is_early_departure,
        is_complete,
        worked_hours,
    }
}

/// Greedy chronological pairing: an Entry opens a segment, the next Exit
/// closes it. Returns the segments plus the count of exits that had no open
/// segment to close.
fn pair_segments(events: &[ClockEvent]) -> (Vec<Segment>, usize) {
    let mut segments: Vec<Segment> = Vec::new();
    let mut open: Option<ClockEvent> = None;
    let mut orphan_exits = 0usize;

    for event in events {
        match event.kind {
            ClockEventKind::Entry => {
                // A second Entry while one is open leaves the first as an
                // open segment and starts the next.
                if let Some(entry) = open.take() {
                    segments.push(Segment { entry, exit: None });
                }
                open = Some(event.clone());
            }
            ClockEventKind::Exit => match open.take() {
                Some(entry) => segments.push(Segment {
                    entry,
                    exit: Some(event.clone()),
                }),
                None => orphan_exits += 1,
            },
        }
    }

    if let Some(entry) = open {
        segments.push(Segment { entry, exit: None });
    }

    (segments, orphan_exits)
}

/// Only the first Entry of the day is held against the entry bound; a late
/// return from a midday break is not flagged.
fn late_on_first_entry(resolved: &ResolvedDay, events: &[ClockEvent]) -> bool {
    let Some(entry_time) = resolved.entry_time else {
        return false;
    };
    let Some(first_entry) = events.iter().find(|e| e.kind == ClockEventKind::Entry) else {
        return false;
    };
    // Arriving exactly at entry + tolerance is still on time.
    let bound = resolved.date.and_time(entry_time)
        + Duration::minutes(i64::from(resolved.tolerance_minutes));
    naive(first_entry.timestamp) > bound
}

/// Only the last Exit of the day is held against the exit bound.
fn early_on_last_exit(resolved: &ResolvedDay, events: &[ClockEvent]) -> bool {
    let Some(exit_time) = resolved.exit_time else {
        return false;
    };
    let Some(last_exit) = events.iter().rev().find(|e| e.kind == ClockEventKind::Exit) else {
        return false;
    };
    let bound = resolved.date.and_time(exit_time)
        - Duration::minutes(i64::from(resolved.tolerance_minutes));
    naive(last_exit.timestamp) < bound
}

// Event instants are compared to schedule times on the event's own calendar
// day; the check-in surface records instants already normalized to the
// department locale.
fn naive(instant: DateTime<Utc>) -> NaiveDateTime {
    instant.naive_utc()
}
