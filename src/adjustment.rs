// src/adjustment.rs
//
// Correction requests against historical clock events. The state machine is
// deliberately small: Pending is the only live state, Approved and Rejected
// are terminal. The transitions here mutate the request only; rewriting the
// referenced clock event on approval is the engine's job so both writes
// happen under one locking scope.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{require_text, EngineError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentStatus {
    Pending,
    Approved,
    Rejected,
}

impl AdjustmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentStatus::Pending => "pending",
            AdjustmentStatus::Approved => "approved",
            AdjustmentStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for AdjustmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An employee-initiated, supervisor-arbitrated correction to one clock
/// event. `original_timestamp` is snapshotted at request creation and never
/// touched again, so the audit trail survives the event being rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentRequest {
    pub id: String,
    pub clock_event_id: String,
    pub employee_id: String,
    pub original_timestamp: DateTime<Utc>,
    pub requested_timestamp: DateTime<Utc>,
    pub reason: String,
    pub status: AdjustmentStatus,
    pub supervisor_id: Option<String>,
    pub rejection_reason: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl AdjustmentRequest {
    pub(crate) fn ensure_pending(&self) -> Result<(), EngineError> {
        if self.status != AdjustmentStatus::Pending {
            return Err(EngineError::AlreadyResolved {
                request_id: self.id.clone(),
                status: self.status,
            });
        }
        Ok(())
    }

    /// Pending -> Approved. The caller must rewrite the clock event in the
    /// same critical section.
    pub fn approve(&mut self, supervisor_id: &str, now: DateTime<Utc>) -> Result<(), EngineError> {
        self.ensure_pending()?;
        self.status = AdjustmentStatus::Approved;
        self.supervisor_id = Some(supervisor_id.to_string());
        self.resolved_at = Some(now);
        Ok(())
    }

    /// Pending -> Rejected. The clock event is left untouched.
    pub fn reject(
        &mut self,
        supervisor_id: &str,
        rejection_reason: &str,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        require_text("rejection_reason", rejection_reason)?;
        self.ensure_pending()?;
        self.status = AdjustmentStatus::Rejected;
        self.supervisor_id = Some(supervisor_id.to_string());
        self.rejection_reason = Some(rejection_reason.to_string());
        self.resolved_at = Some(now);
        Ok(())
    }
}
