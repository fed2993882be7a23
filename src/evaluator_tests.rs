// src/evaluator_tests.rs

#[cfg(test)]
mod tests {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
    use rust_decimal_macros::dec;

    use crate::evaluator::{evaluate, ClockEvent, ClockEventKind};
    use crate::resolver::ResolvedDay;

    fn d(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .unwrap_or_else(|_| panic!("Invalid date string format: {}", value))
    }

    fn t(value: &str) -> NaiveTime {
        NaiveTime::parse_from_str(value, "%H:%M")
            .unwrap_or_else(|_| panic!("Invalid time string format: {}", value))
    }

    fn ts(value: &str) -> DateTime<Utc> {
        let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M")
            .unwrap_or_else(|_| panic!("Invalid datetime string format: {}", value));
        Utc.from_utc_datetime(&naive)
    }

    fn ev(id: &str, kind: ClockEventKind, at: &str) -> ClockEvent {
        ClockEvent {
            id: id.to_string(),
            employee_id: "E1".to_string(),
            department: "ops".to_string(),
            kind,
            timestamp: ts(at),
            location: None,
        }
    }

    fn entry(id: &str, at: &str) -> ClockEvent {
        ev(id, ClockEventKind::Entry, at)
    }

    fn exit(id: &str, at: &str) -> ClockEvent {
        ev(id, ClockEventKind::Exit, at)
    }

    // Monday 2026-03-02, 09:00-18:00, 10 minutes of tolerance.
    fn enforced_day() -> ResolvedDay {
        ResolvedDay {
            date: d("2026-03-02"),
            day_off: false,
            flexible: false,
            entry_time: Some(t("09:00")),
            exit_time: Some(t("18:00")),
            exit_time_morning: None,
            entry_time_afternoon: None,
            tolerance_minutes: 10,
        }
    }

    #[test]
    fn flexible_day_is_never_late_or_early() {
        let resolved = ResolvedDay::flexible(d("2026-03-02"));
        let events = vec![
            entry("1", "2026-03-02 11:37"),
            exit("2", "2026-03-02 13:02"),
        ];

        let facts = evaluate(&resolved, &events);

        assert!(!facts.is_late);
        assert!(!facts.is_early_departure);
        assert!(facts.is_complete);
        // Flexible is not untracked: hours are still summed.
        assert_eq!(facts.worked_hours, dec!(1.42));
    }

    #[test]
    fn day_off_with_no_events_is_complete_and_zero_hours() {
        let facts = evaluate(&ResolvedDay::day_off(d("2026-03-07")), &[]);

        assert!(facts.is_complete);
        assert!(!facts.is_late);
        assert!(!facts.is_early_departure);
        assert_eq!(facts.worked_hours, dec!(0));
        assert!(facts.segments.is_empty());
    }

    #[test]
    fn day_off_events_are_extra_not_anomalous() {
        let events = vec![
            entry("1", "2026-03-07 10:00"),
            exit("2", "2026-03-07 12:00"),
        ];

        let facts = evaluate(&ResolvedDay::day_off(d("2026-03-07")), &events);

        assert!(!facts.is_late);
        assert!(!facts.is_early_departure);
        assert!(facts.is_complete);
        assert_eq!(facts.worked_hours, dec!(2));
    }

    #[test]
    fn entry_exactly_at_tolerance_bound_is_not_late() {
        let events = vec![
            entry("1", "2026-03-02 09:10"),
            exit("2", "2026-03-02 18:00"),
        ];

        let facts = evaluate(&enforced_day(), &events);

        assert!(!facts.is_late);
    }

    #[test]
    fn entry_one_minute_past_the_bound_is_late() {
        let events = vec![
            entry("1", "2026-03-02 09:11"),
            exit("2", "2026-03-02 18:00"),
        ];

        let facts = evaluate(&enforced_day(), &events);

        assert!(facts.is_late);
    }

    #[test]
    fn exit_exactly_at_tolerance_bound_is_not_early() {
        let events = vec![
            entry("1", "2026-03-02 09:00"),
            exit("2", "2026-03-02 17:50"),
        ];

        let facts = evaluate(&enforced_day(), &events);

        assert!(!facts.is_early_departure);
    }

    #[test]
    fn exit_one_minute_before_the_bound_is_early() {
        let events = vec![
            entry("1", "2026-03-02 09:00"),
            exit("2", "2026-03-02 17:49"),
        ];

        let facts = evaluate(&enforced_day(), &events);

        assert!(facts.is_early_departure);
    }

    #[test]
    fn late_and_early_monday_scenario() {
        let events = vec![
            entry("1", "2026-03-02 09:12"),
            exit("2", "2026-03-02 17:50"),
        ];

        let facts = evaluate(&enforced_day(), &events);

        assert!(facts.is_late, "12 minutes past entry beats the 10 allowed");
        assert!(facts.is_early_departure);
        assert!(facts.is_complete);
        assert_eq!(facts.worked_hours, dec!(8.63));
    }

    #[test]
    fn split_shift_pairs_two_segments_without_afternoon_lateness() {
        let resolved = ResolvedDay {
            exit_time_morning: Some(t("13:00")),
            entry_time_afternoon: Some(t("15:00")),
            ..enforced_day()
        };
        let events = vec![
            entry("1", "2026-03-02 09:00"),
            exit("2", "2026-03-02 13:05"),
            entry("3", "2026-03-02 15:00"),
            exit("4", "2026-03-02 18:00"),
        ];

        let facts = evaluate(&resolved, &events);

        assert_eq!(facts.segments.len(), 2);
        assert!(facts.segments.iter().all(|s| s.exit.is_some()));
        // Only the first entry of the day is held against the entry bound.
        assert!(!facts.is_late);
        assert!(!facts.is_early_departure);
        assert!(facts.is_complete);
        assert_eq!(facts.worked_hours, dec!(7.08));
    }

    #[test]
    fn trailing_open_entry_is_incomplete_and_contributes_nothing() {
        let events = vec![
            entry("1", "2026-03-02 09:00"),
            exit("2", "2026-03-02 13:00"),
            entry("3", "2026-03-02 15:00"),
        ];

        let facts = evaluate(&enforced_day(), &events);

        assert!(!facts.is_complete);
        assert_eq!(facts.segments.len(), 2);
        assert!(facts.segments[1].exit.is_none());
        assert_eq!(facts.worked_hours, dec!(4));
    }

    #[test]
    fn orphan_exit_flags_the_day_incomplete() {
        let events = vec![
            exit("1", "2026-03-02 08:55"),
            entry("2", "2026-03-02 09:00"),
            exit("3", "2026-03-02 18:00"),
        ];

        let facts = evaluate(&enforced_day(), &events);

        assert!(!facts.is_complete);
        assert_eq!(facts.segments.len(), 1);
        assert_eq!(facts.worked_hours, dec!(9));
        assert!(!facts.is_late);
    }

    #[test]
    fn double_entry_leaves_first_segment_open() {
        let events = vec![
            entry("1", "2026-03-02 09:00"),
            entry("2", "2026-03-02 09:30"),
            exit("3", "2026-03-02 18:00"),
        ];

        let facts = evaluate(&enforced_day(), &events);

        assert!(!facts.is_complete);
        assert_eq!(facts.segments.len(), 2);
        assert!(facts.segments[0].exit.is_none());
        assert_eq!(facts.worked_hours, dec!(8.5));
    }

    #[test]
    fn scheduled_day_with_no_events_is_incomplete() {
        let facts = evaluate(&enforced_day(), &[]);

        assert!(!facts.is_complete);
        assert!(!facts.is_late);
        assert!(!facts.is_early_departure);
        assert_eq!(facts.worked_hours, dec!(0));
    }

    #[test]
    fn evaluation_orders_events_and_is_deterministic() {
        let shuffled = vec![
            exit("2", "2026-03-02 17:50"),
            entry("1", "2026-03-02 09:12"),
        ];
        let ordered = vec![
            entry("1", "2026-03-02 09:12"),
            exit("2", "2026-03-02 17:50"),
        ];

        let first = evaluate(&enforced_day(), &shuffled);
        let second = evaluate(&enforced_day(), &ordered);

        assert_eq!(first, second);
        assert_eq!(first.events[0].id, "1");
    }
}
