// src/late_notice.rs
//
// Supervisor-raised flags on attendance anomalies. One notice at most per
// (employee, date); the employee can justify it, the supervisor tracks
// read state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{require_text, EngineError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LateNotice {
    pub id: String,
    pub employee_id: String,
    pub supervisor_id: String,
    pub clock_event_id: String,
    pub date: NaiveDate,
    pub justified: bool,
    pub justification: Option<String>,
    pub read: bool,
}

impl LateNotice {
    /// Re-justification is allowed and overwrites the previous text.
    pub fn justify(&mut self, text: &str) -> Result<(), EngineError> {
        require_text("justification", text)?;
        self.justified = true;
        self.justification = Some(text.to_string());
        Ok(())
    }

    /// Idempotent.
    pub fn mark_read(&mut self) {
        self.read = true;
    }
}
