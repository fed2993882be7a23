// src/error.rs
use chrono::NaiveDate;
use thiserror::Error;

use crate::adjustment::AdjustmentStatus;

/// Coarse classification of engine failures. Every error the engine can
/// return falls into exactly one of these; the HTTP layer maps them to
/// status codes and callers can branch on them without matching every
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing required input.
    Validation,
    /// A referenced entity does not exist.
    NotFound,
    /// A transition was attempted from a non-eligible state.
    InvalidState,
    /// A uniqueness or precedence rule would be violated.
    Conflict,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("employee not found: {0}")]
    EmployeeNotFound(String),

    #[error("clock event not found: {0}")]
    ClockEventNotFound(String),

    #[error("shift not found: {0}")]
    ShiftNotFound(String),

    #[error("schedule '{name}' not found for department {department}")]
    ScheduleNotFound { department: String, name: String },

    #[error("adjustment request not found: {0}")]
    AdjustmentNotFound(String),

    #[error("late notice not found: {0}")]
    NoticeNotFound(String),

    #[error("clock event {event_id} does not belong to employee {employee_id}")]
    NotEventOwner {
        event_id: String,
        employee_id: String,
    },

    #[error("late notice {notice_id} does not belong to employee {employee_id}")]
    NotNoticeOwner {
        notice_id: String,
        employee_id: String,
    },

    #[error("clock event {event_id} is not on {date}")]
    EventDateMismatch { event_id: String, date: NaiveDate },

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("date range start {from} is after end {to}")]
    InvertedDateRange { from: NaiveDate, to: NaiveDate },

    #[error("clock event {event_id} already has a pending adjustment request")]
    DuplicatePendingAdjustment { event_id: String },

    #[error("adjustment request {request_id} is already {status}")]
    AlreadyResolved {
        request_id: String,
        status: AdjustmentStatus,
    },

    #[error("a late notice already exists for employee {employee_id} on {date}")]
    DuplicateNotice {
        employee_id: String,
        date: NaiveDate,
    },

    #[error("no lateness or early departure recorded for employee {employee_id} on {date}")]
    NoAnomalyForDate {
        employee_id: String,
        date: NaiveDate,
    },
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::EmployeeNotFound(_)
            | EngineError::ClockEventNotFound(_)
            | EngineError::ShiftNotFound(_)
            | EngineError::ScheduleNotFound { .. }
            | EngineError::AdjustmentNotFound(_)
            | EngineError::NoticeNotFound(_) => ErrorKind::NotFound,

            EngineError::NotEventOwner { .. }
            | EngineError::NotNoticeOwner { .. }
            | EngineError::EventDateMismatch { .. }
            | EngineError::EmptyField { .. }
            | EngineError::InvertedDateRange { .. } => ErrorKind::Validation,

            EngineError::AlreadyResolved { .. } => ErrorKind::InvalidState,

            EngineError::DuplicatePendingAdjustment { .. }
            | EngineError::DuplicateNotice { .. }
            | EngineError::NoAnomalyForDate { .. } => ErrorKind::Conflict,
        }
    }
}

/// Rejects empty or whitespace-only free-text input.
pub fn require_text(field: &'static str, value: &str) -> Result<(), EngineError> {
    if value.trim().is_empty() {
        return Err(EngineError::EmptyField { field });
    }
    Ok(())
}
