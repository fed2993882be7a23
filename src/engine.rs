// src/engine.rs
//
// The attendance engine: in-memory stores for catalog records, clock events
// and workflow state, plus the public operations the surrounding surfaces
// call. Attendance facts are derived on every read and never cached, so an
// approved adjustment is reflected by the next evaluation with no
// invalidation step.
//
// Lock discipline: every operation takes one store lock at a time, scoped as
// tightly as possible. The single exception is adjustment approval, which
// nests clock_events inside adjustments so the status transition and the
// event rewrite commit together; no other path nests locks, so that order
// cannot deadlock.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::adjustment::{AdjustmentRequest, AdjustmentStatus};
use crate::clock::Clock;
use crate::error::{require_text, EngineError};
use crate::evaluator::{evaluate, AttendanceDayFacts, ClockEvent, ClockEventKind, GeoPoint};
use crate::late_notice::LateNotice;
use crate::resolver::{resolve_day, ResolvedDay};
use crate::schedule::{
    select_schedule, DepartmentSchedule, DepartmentShift, Employee, ShiftAssignment,
};

#[derive(Clone)]
pub struct AttendanceEngine {
    clock: Clock,
    employees: Arc<Mutex<HashMap<String, Employee>>>,
    /// department -> schedule name -> schedule. BTreeMap so the "first"
    /// schedule fallback is deterministic.
    schedules: Arc<Mutex<HashMap<String, BTreeMap<String, DepartmentSchedule>>>>,
    shifts: Arc<Mutex<HashMap<String, DepartmentShift>>>,
    assignments: Arc<Mutex<HashMap<(String, NaiveDate), ShiftAssignment>>>,
    clock_events: Arc<Mutex<HashMap<String, ClockEvent>>>,
    adjustments: Arc<Mutex<HashMap<String, AdjustmentRequest>>>,
    notices: Arc<Mutex<HashMap<String, LateNotice>>>,
    event_seq: Arc<AtomicU64>,
    adjustment_seq: Arc<AtomicU64>,
    notice_seq: Arc<AtomicU64>,
}

fn next_id(seq: &AtomicU64, prefix: &str) -> String {
    format!("{}-{:06}", prefix, seq.fetch_add(1, Ordering::Relaxed) + 1)
}

impl AttendanceEngine {
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            employees: Arc::new(Mutex::new(HashMap::new())),
            schedules: Arc::new(Mutex::new(HashMap::new())),
            shifts: Arc::new(Mutex::new(HashMap::new())),
            assignments: Arc::new(Mutex::new(HashMap::new())),
            clock_events: Arc::new(Mutex::new(HashMap::new())),
            adjustments: Arc::new(Mutex::new(HashMap::new())),
            notices: Arc::new(Mutex::new(HashMap::new())),
            event_seq: Arc::new(AtomicU64::new(0)),
            adjustment_seq: Arc::new(AtomicU64::new(0)),
            notice_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    // --- Catalog configuration ---

    pub fn configure_employee(&self, employee: Employee) {
        info!("Configuring employee: {:?}", employee);
        self.employees
            .lock()
            .unwrap()
            .insert(employee.id.clone(), employee);
    }

    pub fn upsert_schedule(&self, schedule: DepartmentSchedule) {
        info!(
            "Configuring schedule '{}' for department {}",
            schedule.name, schedule.department
        );
        self.schedules
            .lock()
            .unwrap()
            .entry(schedule.department.clone())
            .or_default()
            .insert(schedule.name.clone(), schedule);
    }

    /// Employees left without any schedule keep resolving, as unscheduled
    /// day-off, for dates not covered by a shift assignment.
    pub fn remove_schedule(&self, department: &str, name: &str) -> Result<(), EngineError> {
        let mut schedules = self.schedules.lock().unwrap();
        let removed = schedules
            .get_mut(department)
            .and_then(|set| set.remove(name));
        match removed {
            Some(_) => {
                info!("Removed schedule '{}' from department {}", name, department);
                Ok(())
            }
            None => Err(EngineError::ScheduleNotFound {
                department: department.to_string(),
                name: name.to_string(),
            }),
        }
    }

    pub fn upsert_shift(&self, shift: DepartmentShift) {
        info!(
            "Configuring shift '{}' ({}) for department {}",
            shift.name, shift.id, shift.department
        );
        self.shifts.lock().unwrap().insert(shift.id.clone(), shift);
    }

    /// Existing assignments are left in place; dates pointing at the removed
    /// shift resolve against the department default from now on.
    pub fn remove_shift(&self, shift_id: &str) -> Result<(), EngineError> {
        match self.shifts.lock().unwrap().remove(shift_id) {
            Some(shift) => {
                info!("Removed shift '{}' ({})", shift.name, shift_id);
                Ok(())
            }
            None => Err(EngineError::ShiftNotFound(shift_id.to_string())),
        }
    }

    /// Assigns one shift across a date range, one independent write per
    /// date. Dates outside the shift's active weekdays are skipped, not
    /// failed; returns how many dates were actually assigned.
    pub fn assign_shift_range(
        &self,
        employee_id: &str,
        shift_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<usize, EngineError> {
        self.employee(employee_id)?;
        let shift = self
            .shifts
            .lock()
            .unwrap()
            .get(shift_id)
            .cloned()
            .ok_or_else(|| EngineError::ShiftNotFound(shift_id.to_string()))?;
        if from > to {
            return Err(EngineError::InvertedDateRange { from, to });
        }

        let mut assigned = 0usize;
        let mut date = from;
        loop {
            if shift.active_on(date.weekday()) {
                let assignment = ShiftAssignment {
                    employee_id: employee_id.to_string(),
                    shift_id: shift_id.to_string(),
                    date,
                };
                let replaced = self
                    .assignments
                    .lock()
                    .unwrap()
                    .insert((employee_id.to_string(), date), assignment)
                    .is_some();
                if replaced {
                    debug!(
                        "Replaced prior shift assignment for {} on {}",
                        employee_id, date
                    );
                }
                assigned += 1;
            } else {
                debug!(
                    "Skipping {}: shift '{}' not active on {:?}",
                    date,
                    shift.name,
                    date.weekday()
                );
            }
            if date == to {
                break;
            }
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }

        info!(
            "Assigned shift '{}' to {} on {} of the dates in {}..={}",
            shift.name, employee_id, assigned, from, to
        );
        Ok(assigned)
    }

    // --- Clock events ---

    pub fn record_clock_event(
        &self,
        employee_id: &str,
        kind: ClockEventKind,
        timestamp: DateTime<Utc>,
        location: Option<GeoPoint>,
    ) -> Result<ClockEvent, EngineError> {
        let employee = self.employee(employee_id)?;
        let event = ClockEvent {
            id: next_id(&self.event_seq, "EVT"),
            employee_id: employee.id,
            department: employee.department,
            kind,
            timestamp,
            location,
        };
        info!(
            "Recording clock event {} ({:?}) for {} at {}",
            event.id, event.kind, event.employee_id, event.timestamp
        );
        self.clock_events
            .lock()
            .unwrap()
            .insert(event.id.clone(), event.clone());
        Ok(event)
    }

    /// Collaborator-facing removal (the check-in surface owns event
    /// lifecycle outside the adjustment workflow). A pending adjustment
    /// whose event vanishes stays pending and fails approval cleanly.
    pub fn remove_clock_event(&self, event_id: &str) -> bool {
        let removed = self.clock_events.lock().unwrap().remove(event_id).is_some();
        if removed {
            info!("Removed clock event {}", event_id);
        }
        removed
    }

    /// One employee's punches for one calendar date, in chronological order.
    pub fn events_for_day(&self, employee_id: &str, date: NaiveDate) -> Vec<ClockEvent> {
        let mut events: Vec<ClockEvent> = self
            .clock_events
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.employee_id == employee_id && e.timestamp.date_naive() == date)
            .cloned()
            .collect();
        events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        events
    }

    // --- Resolution and evaluation (side-effect-free reads) ---

    pub fn resolved_schedule(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<ResolvedDay, EngineError> {
        let employee = self.employee(employee_id)?;

        let assigned_shift_id = self
            .assignments
            .lock()
            .unwrap()
            .get(&(employee_id.to_string(), date))
            .map(|assignment| assignment.shift_id.clone());
        // An assignment whose shift was deleted falls through to the
        // department default.
        let shift = assigned_shift_id
            .and_then(|shift_id| self.shifts.lock().unwrap().get(&shift_id).cloned());

        let schedule = self
            .schedules
            .lock()
            .unwrap()
            .get(&employee.department)
            .and_then(|set| select_schedule(set, employee.schedule_name.as_deref()).cloned());

        Ok(resolve_day(date, shift.as_ref(), schedule.as_ref()))
    }

    pub fn attendance_facts(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<AttendanceDayFacts, EngineError> {
        let resolved = self.resolved_schedule(employee_id, date)?;
        let events = self.events_for_day(employee_id, date);
        Ok(evaluate(&resolved, &events))
    }

    // --- Adjustment workflow ---

    pub fn create_adjustment(
        &self,
        employee_id: &str,
        clock_event_id: &str,
        requested_timestamp: DateTime<Utc>,
        reason: &str,
    ) -> Result<AdjustmentRequest, EngineError> {
        require_text("reason", reason)?;

        let event = self
            .clock_events
            .lock()
            .unwrap()
            .get(clock_event_id)
            .cloned()
            .ok_or_else(|| EngineError::ClockEventNotFound(clock_event_id.to_string()))?;
        if event.employee_id != employee_id {
            return Err(EngineError::NotEventOwner {
                event_id: clock_event_id.to_string(),
                employee_id: employee_id.to_string(),
            });
        }

        let mut adjustments = self.adjustments.lock().unwrap();
        let already_pending = adjustments.values().any(|request| {
            request.clock_event_id == clock_event_id
                && request.status == AdjustmentStatus::Pending
        });
        if already_pending {
            return Err(EngineError::DuplicatePendingAdjustment {
                event_id: clock_event_id.to_string(),
            });
        }

        let request = AdjustmentRequest {
            id: next_id(&self.adjustment_seq, "ADJ"),
            clock_event_id: clock_event_id.to_string(),
            employee_id: employee_id.to_string(),
            // Audit snapshot; stays put even after the event is rewritten.
            original_timestamp: event.timestamp,
            requested_timestamp,
            reason: reason.to_string(),
            status: AdjustmentStatus::Pending,
            supervisor_id: None,
            rejection_reason: None,
            resolved_at: None,
        };
        info!(
            "Created adjustment request {} on event {} ({} -> {})",
            request.id, clock_event_id, request.original_timestamp, requested_timestamp
        );
        adjustments.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    /// Approves a pending request and rewrites the referenced clock event's
    /// timestamp, atomically: both locks are held across the mutation and
    /// the event is checked first, so a vanished event leaves the request
    /// pending.
    pub fn approve_adjustment(
        &self,
        request_id: &str,
        supervisor_id: &str,
    ) -> Result<AdjustmentRequest, EngineError> {
        let mut adjustments = self.adjustments.lock().unwrap();
        let request = adjustments
            .get_mut(request_id)
            .ok_or_else(|| EngineError::AdjustmentNotFound(request_id.to_string()))?;
        // State check first: a resolved request reports InvalidState even if
        // its clock event has since vanished.
        request.ensure_pending()?;

        let mut events = self.clock_events.lock().unwrap();
        let Some(event) = events.get_mut(&request.clock_event_id) else {
            warn!(
                "Approval of {} failed: clock event {} no longer exists; request stays pending",
                request_id, request.clock_event_id
            );
            return Err(EngineError::ClockEventNotFound(
                request.clock_event_id.clone(),
            ));
        };

        request.approve(supervisor_id, self.clock.now())?;
        event.timestamp = request.requested_timestamp;
        info!(
            "Approved adjustment {}: event {} now at {}",
            request_id, event.id, event.timestamp
        );
        Ok(request.clone())
    }

    pub fn reject_adjustment(
        &self,
        request_id: &str,
        supervisor_id: &str,
        rejection_reason: &str,
    ) -> Result<AdjustmentRequest, EngineError> {
        let mut adjustments = self.adjustments.lock().unwrap();
        let request = adjustments
            .get_mut(request_id)
            .ok_or_else(|| EngineError::AdjustmentNotFound(request_id.to_string()))?;
        request.reject(supervisor_id, rejection_reason, self.clock.now())?;
        info!("Rejected adjustment {}: {}", request_id, rejection_reason);
        Ok(request.clone())
    }

    pub fn adjustments_for_employee(&self, employee_id: &str) -> Vec<AdjustmentRequest> {
        let mut requests: Vec<AdjustmentRequest> = self
            .adjustments
            .lock()
            .unwrap()
            .values()
            .filter(|request| request.employee_id == employee_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| a.id.cmp(&b.id));
        requests
    }

    // --- Late-notice ledger ---

    /// Raising a notice is gated on the evaluator actually reporting an
    /// anomaly for that day, and on no notice existing yet for the
    /// (employee, date) pair.
    pub fn raise_late_notice(
        &self,
        supervisor_id: &str,
        employee_id: &str,
        clock_event_id: &str,
        date: NaiveDate,
    ) -> Result<LateNotice, EngineError> {
        let event = self
            .clock_events
            .lock()
            .unwrap()
            .get(clock_event_id)
            .cloned()
            .ok_or_else(|| EngineError::ClockEventNotFound(clock_event_id.to_string()))?;
        if event.employee_id != employee_id {
            return Err(EngineError::NotEventOwner {
                event_id: clock_event_id.to_string(),
                employee_id: employee_id.to_string(),
            });
        }
        if event.timestamp.date_naive() != date {
            return Err(EngineError::EventDateMismatch {
                event_id: clock_event_id.to_string(),
                date,
            });
        }

        let facts = self.attendance_facts(employee_id, date)?;
        if !facts.is_late && !facts.is_early_departure {
            return Err(EngineError::NoAnomalyForDate {
                employee_id: employee_id.to_string(),
                date,
            });
        }

        let mut notices = self.notices.lock().unwrap();
        let duplicate = notices
            .values()
            .any(|notice| notice.employee_id == employee_id && notice.date == date);
        if duplicate {
            return Err(EngineError::DuplicateNotice {
                employee_id: employee_id.to_string(),
                date,
            });
        }

        let notice = LateNotice {
            id: next_id(&self.notice_seq, "NTC"),
            employee_id: employee_id.to_string(),
            supervisor_id: supervisor_id.to_string(),
            clock_event_id: clock_event_id.to_string(),
            date,
            justified: false,
            justification: None,
            read: false,
        };
        info!(
            "Raised late notice {} for {} on {} (late={}, early={})",
            notice.id, employee_id, date, facts.is_late, facts.is_early_departure
        );
        notices.insert(notice.id.clone(), notice.clone());
        Ok(notice)
    }

    pub fn justify_late_notice(
        &self,
        notice_id: &str,
        employee_id: &str,
        text: &str,
    ) -> Result<LateNotice, EngineError> {
        let mut notices = self.notices.lock().unwrap();
        let notice = notices
            .get_mut(notice_id)
            .ok_or_else(|| EngineError::NoticeNotFound(notice_id.to_string()))?;
        if notice.employee_id != employee_id {
            return Err(EngineError::NotNoticeOwner {
                notice_id: notice_id.to_string(),
                employee_id: employee_id.to_string(),
            });
        }
        notice.justify(text)?;
        info!("Late notice {} justified by {}", notice_id, employee_id);
        Ok(notice.clone())
    }

    pub fn mark_notice_read(&self, notice_id: &str) -> Result<LateNotice, EngineError> {
        let mut notices = self.notices.lock().unwrap();
        let notice = notices
            .get_mut(notice_id)
            .ok_or_else(|| EngineError::NoticeNotFound(notice_id.to_string()))?;
        notice.mark_read();
        Ok(notice.clone())
    }

    pub fn notices_for_employee(&self, employee_id: &str) -> Vec<LateNotice> {
        let mut result: Vec<LateNotice> = self
            .notices
            .lock()
            .unwrap()
            .values()
            .filter(|notice| notice.employee_id == employee_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.id.cmp(&b.id));
        result
    }

    // --- Helpers ---

    fn employee(&self, employee_id: &str) -> Result<Employee, EngineError> {
        self.employees
            .lock()
            .unwrap()
            .get(employee_id)
            .cloned()
            .ok_or_else(|| EngineError::EmployeeNotFound(employee_id.to_string()))
    }
}
