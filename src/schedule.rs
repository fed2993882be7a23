// src/schedule.rs
//
// Schedule catalog records: department default schedules with per-weekday
// overrides, reusable department shifts, and per-date shift assignments.
// These are plain configuration values; all precedence logic lives in the
// resolver.

use std::collections::{BTreeMap, HashSet};

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub department: String,
    /// Names the department schedule this employee follows. `None` falls
    /// back to the department's first schedule in name order.
    pub schedule_name: Option<String>,
}

/// A department default schedule. A department may carry several, keyed by
/// name; which one applies to an employee is chosen by the employee's
/// `schedule_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentSchedule {
    pub department: String,
    pub name: String,
    pub entry_time: NaiveTime,
    pub exit_time: NaiveTime,
    pub tolerance_minutes: u32,
    /// A flexible schedule never enforces times; overrides are ignored.
    pub flexible: bool,
    #[serde(default)]
    pub overrides: WeekOverrides,
}

/// Up to seven optional per-weekday overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekOverrides {
    pub monday: Option<DayOverride>,
    pub tuesday: Option<DayOverride>,
    pub wednesday: Option<DayOverride>,
    pub thursday: Option<DayOverride>,
    pub friday: Option<DayOverride>,
    pub saturday: Option<DayOverride>,
    pub sunday: Option<DayOverride>,
}

impl WeekOverrides {
    pub fn for_weekday(&self, weekday: Weekday) -> Option<&DayOverride> {
        match weekday {
            Weekday::Mon => self.monday.as_ref(),
            Weekday::Tue => self.tuesday.as_ref(),
            Weekday::Wed => self.wednesday.as_ref(),
            Weekday::Thu => self.thursday.as_ref(),
            Weekday::Fri => self.friday.as_ref(),
            Weekday::Sat => self.saturday.as_ref(),
            Weekday::Sun => self.sunday.as_ref(),
        }
    }
}

/// One weekday's deviation from the schedule base. Absent time fields fall
/// back to the parent schedule field by field; `day_off` trumps everything
/// else in the record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayOverride {
    #[serde(default)]
    pub entry_time: Option<NaiveTime>,
    #[serde(default)]
    pub exit_time: Option<NaiveTime>,
    /// Morning segment end, for split-shift days.
    #[serde(default)]
    pub exit_time_morning: Option<NaiveTime>,
    /// Afternoon segment start, for split-shift days.
    #[serde(default)]
    pub entry_time_afternoon: Option<NaiveTime>,
    #[serde(default)]
    pub tolerance_minutes: Option<u32>,
    #[serde(default)]
    pub day_off: bool,
}

/// A named, reusable shift a supervisor can pin to an employee for specific
/// dates. Assignable only on its active weekdays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentShift {
    pub id: String,
    pub department: String,
    pub name: String,
    pub entry_time: NaiveTime,
    pub exit_time: NaiveTime,
    #[serde(default)]
    pub exit_time_morning: Option<NaiveTime>,
    #[serde(default)]
    pub entry_time_afternoon: Option<NaiveTime>,
    pub tolerance_minutes: u32,
    pub flexible: bool,
    pub active_weekdays: HashSet<Weekday>,
}

impl DepartmentShift {
    pub fn active_on(&self, weekday: Weekday) -> bool {
        self.active_weekdays.contains(&weekday)
    }
}

/// Binds one shift to one employee on one calendar date. At most one per
/// (employee, date); a later write replaces the earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftAssignment {
    pub employee_id: String,
    pub shift_id: String,
    pub date: NaiveDate,
}

/// Picks the schedule that applies to an employee from a department's named
/// set: the designated name when it still exists, otherwise the first
/// schedule in name order.
pub fn select_schedule<'a>(
    schedules: &'a BTreeMap<String, DepartmentSchedule>,
    schedule_name: Option<&str>,
) -> Option<&'a DepartmentSchedule> {
    match schedule_name {
        Some(name) => schedules.get(name).or_else(|| schedules.values().next()),
        None => schedules.values().next(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(value: &str) -> NaiveTime {
        NaiveTime::parse_from_str(value, "%H:%M").unwrap()
    }

    fn schedule(name: &str) -> DepartmentSchedule {
        DepartmentSchedule {
            department: "ops".to_string(),
            name: name.to_string(),
            entry_time: t("09:00"),
            exit_time: t("18:00"),
            tolerance_minutes: 10,
            flexible: false,
            overrides: WeekOverrides::default(),
        }
    }

    #[test]
    fn for_weekday_maps_every_slot() {
        let overrides = WeekOverrides {
            wednesday: Some(DayOverride {
                day_off: true,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(overrides.for_weekday(Weekday::Wed).unwrap().day_off);
        assert!(overrides.for_weekday(Weekday::Mon).is_none());
        assert!(overrides.for_weekday(Weekday::Sun).is_none());
    }

    #[test]
    fn select_schedule_prefers_designated_name() {
        let mut set = BTreeMap::new();
        set.insert("general".to_string(), schedule("general"));
        set.insert("reduced".to_string(), schedule("reduced"));

        let picked = select_schedule(&set, Some("reduced")).unwrap();
        assert_eq!(picked.name, "reduced");
    }

    #[test]
    fn select_schedule_falls_back_to_first_in_name_order() {
        let mut set = BTreeMap::new();
        set.insert("general".to_string(), schedule("general"));
        set.insert("reduced".to_string(), schedule("reduced"));

        assert_eq!(select_schedule(&set, None).unwrap().name, "general");
        // Designated schedule was deleted: degrade to the first remaining one.
        assert_eq!(select_schedule(&set, Some("gone")).unwrap().name, "general");
        assert!(select_schedule(&BTreeMap::new(), None).is_none());
    }
}
