// ABOUTME: Progress record snapshot and its stage/status enums.
// ABOUTME: Records are replaced whole on every change, never edited in place.

use crate::types::TenantId;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Pipeline stage a tenant is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Queued,
    AllocatingPort,
    Launching,
    WaitingForDatabase,
    WaitingForApplication,
    Finalizing,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Processing,
    Completed,
    Error,
}

impl Status {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::Processing)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressRecord {
    pub tenant_id: TenantId,
    pub stage: Stage,
    pub message: String,
    pub percent: u8,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

impl ProgressRecord {
    pub(super) fn new(
        tenant_id: TenantId,
        stage: Stage,
        message: String,
        percent: u8,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            tenant_id,
            stage,
            message,
            percent: percent.min(100),
            status: Status::Processing,
            created_at: now,
            updated_at: now,
            result: None,
            error: None,
        }
    }

    /// Next snapshot after a stage update. Percent never goes backwards.
    pub(super) fn advanced(
        &self,
        stage: Stage,
        message: String,
        percent: u8,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            stage,
            message,
            percent: self.percent.max(percent.min(100)),
            updated_at: now,
            ..self.clone()
        }
    }

    pub(super) fn completed(
        &self,
        message: String,
        result: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            stage: Stage::Completed,
            message,
            percent: 100,
            status: Status::Completed,
            updated_at: now,
            result: Some(result),
            ..self.clone()
        }
    }

    /// Failure keeps the stage and freezes the percent where it stood.
    pub(super) fn failed(&self, message: String, error: serde_json::Value, now: DateTime<Utc>) -> Self {
        Self {
            message,
            status: Status::Error,
            updated_at: now,
            error: Some(error),
            ..self.clone()
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
