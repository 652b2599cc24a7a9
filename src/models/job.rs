//! Job domain models and DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Job lifecycle status.
///
/// Forward order: waiting -> to_assign -> assigned -> in_progress -> done.
/// `cancelled` is reachable from any non-terminal state. `done` and
/// `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created by an admin, no technician yet.
    Waiting,
    /// Created by the client, awaiting triage.
    ToAssign,
    /// Technician assigned.
    Assigned,
    /// Technician started the work.
    InProgress,
    /// Work completed.
    Done,
    /// Abandoned before completion.
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::ToAssign => "to_assign",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "waiting" => Some(Self::Waiting),
            "to_assign" => Some(Self::ToAssign),
            "assigned" => Some(Self::Assigned),
            "in_progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }

    /// Position in the forward lifecycle. Cancelled sits outside the chain.
    fn rank(&self) -> u8 {
        match self {
            Self::Waiting => 0,
            Self::ToAssign => 1,
            Self::Assigned => 2,
            Self::InProgress => 3,
            Self::Done => 4,
            Self::Cancelled => 5,
        }
    }

    /// Whether a status change is permitted by the lifecycle.
    ///
    /// Forward moves only: a terminal job accepts nothing, and no status ever
    /// moves backwards. Setting the current status again is a no-op and
    /// always allowed. Reassignment via the assign operation is the single
    /// sanctioned reset and bypasses this table.
    pub fn can_transition(from: JobStatus, to: JobStatus) -> bool {
        if from == to {
            return true;
        }
        if from.is_terminal() {
            return false;
        }
        if to == Self::Cancelled {
            return true;
        }
        to != Self::Waiting && to.rank() > from.rank()
    }

    /// Statuses a technician may move an owned job to.
    pub fn technician_may_target(&self) -> bool {
        matches!(self, Self::InProgress | Self::Done | Self::Cancelled)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sortable columns for job listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobSortField {
    CreatedAt,
    ScheduledDate,
    Priority,
    Id,
}

impl JobSortField {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created_at" => Some(Self::CreatedAt),
            "scheduled_date" => Some(Self::ScheduledDate),
            "priority" => Some(Self::Priority),
            "id" => Some(Self::Id),
            _ => None,
        }
    }
}

/// Request to create a job.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateJobRequest {
    /// Target client. Required for admins; implied by identity for clients.
    #[serde(default)]
    pub client_id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Lower = more urgent. Defaults to 3.
    #[serde(default)]
    pub priority: Option<i16>,
    #[serde(default)]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(default)]
    pub address: Option<String>,
    /// Admin-only: assign a technician at creation time.
    #[serde(default)]
    pub technician_id: Option<i64>,
}

/// Request to update a job (admin: any field; technician: status only).
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateJobRequest {
    /// Rejected if present: client ownership is immutable after creation.
    #[serde(default)]
    pub client_id: Option<i64>,
    #[serde(default)]
    pub technician_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub priority: Option<i16>,
    #[serde(default)]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl UpdateJobRequest {
    /// True when the request touches anything other than `status`.
    pub fn touches_non_status_fields(&self) -> bool {
        self.client_id.is_some()
            || self.technician_id.is_some()
            || self.title.is_some()
            || self.description.is_some()
            || self.priority.is_some()
            || self.scheduled_date.is_some()
            || self.address.is_some()
            || self.completed_at.is_some()
    }
}

/// Request to assign a technician to a job.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AssignTechnicianRequest {
    /// Required; missing id is a validation error, not a no-op.
    #[serde(default)]
    pub technician_id: Option<i64>,
}

/// Job representation returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobResponse {
    pub id: i64,
    /// Display identifier, e.g. "JOB-2026-000042". Assigned once at creation.
    pub external_number: String,
    pub client_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technician_id: Option<i64>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: JobStatus,
    pub priority: i16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<crate::entity::job::Model> for JobResponse {
    fn from(m: crate::entity::job::Model) -> Self {
        let status = JobStatus::parse(&m.status).unwrap_or(JobStatus::Waiting);
        Self {
            id: m.id,
            external_number: m.external_number,
            client_id: m.client_id,
            technician_id: m.technician_id,
            title: m.title,
            description: m.description,
            status,
            priority: m.priority,
            scheduled_date: m.scheduled_date,
            address: m.address,
            created_at: m.created_at,
            updated_at: m.updated_at,
            completed_at: m.completed_at,
        }
    }
}

/// Job list response with pagination.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobListResponse {
    pub jobs: Vec<JobResponse>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

/// Query parameters for listing jobs.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ListJobsQuery {
    /// Filter by status (admin only; others are already scoped).
    #[serde(default)]
    pub status: Option<JobStatus>,
    /// Filter by technician (admin only).
    #[serde(default)]
    pub technician_id: Option<i64>,
    /// Filter by client (admin only).
    #[serde(default)]
    pub client_id: Option<i64>,
    /// Free-text match against external_number and title.
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    /// Clamped to 1..=200.
    #[serde(default)]
    pub limit: Option<u32>,
    /// One of: created_at (default, descending), scheduled_date, priority, id.
    #[serde(default)]
    pub sort: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            JobStatus::Waiting,
            JobStatus::ToAssign,
            JobStatus::Assigned,
            JobStatus::InProgress,
            JobStatus::Done,
            JobStatus::Cancelled,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(JobStatus::parse("open"), None);
    }

    #[test]
    fn test_forward_transitions_allowed() {
        use JobStatus::*;
        assert!(JobStatus::can_transition(Waiting, ToAssign));
        assert!(JobStatus::can_transition(ToAssign, Assigned));
        assert!(JobStatus::can_transition(Assigned, InProgress));
        assert!(JobStatus::can_transition(InProgress, Done));
        // Skipping forward is still monotonic.
        assert!(JobStatus::can_transition(Assigned, Done));
        assert!(JobStatus::can_transition(Waiting, Assigned));
    }

    #[test]
    fn test_backward_transitions_rejected() {
        use JobStatus::*;
        assert!(!JobStatus::can_transition(Done, Waiting));
        assert!(!JobStatus::can_transition(InProgress, Assigned));
        assert!(!JobStatus::can_transition(Assigned, ToAssign));
        assert!(!JobStatus::can_transition(ToAssign, Waiting));
        assert!(!JobStatus::can_transition(InProgress, Waiting));
    }

    #[test]
    fn test_cancel_from_any_non_terminal_state() {
        use JobStatus::*;
        for from in [Waiting, ToAssign, Assigned, InProgress] {
            assert!(JobStatus::can_transition(from, Cancelled));
        }
        assert!(!JobStatus::can_transition(Done, Cancelled));
        assert!(!JobStatus::can_transition(Cancelled, Done));
    }

    #[test]
    fn test_terminal_states_accept_nothing_new() {
        use JobStatus::*;
        for to in [Waiting, ToAssign, Assigned, InProgress] {
            assert!(!JobStatus::can_transition(Done, to));
            assert!(!JobStatus::can_transition(Cancelled, to));
        }
        // Re-setting the current status is a no-op.
        assert!(JobStatus::can_transition(Done, Done));
        assert!(JobStatus::can_transition(Cancelled, Cancelled));
    }

    #[test]
    fn test_technician_target_set() {
        use JobStatus::*;
        assert!(InProgress.technician_may_target());
        assert!(Done.technician_may_target());
        assert!(Cancelled.technician_may_target());
        assert!(!Waiting.technician_may_target());
        assert!(!ToAssign.technician_may_target());
        assert!(!Assigned.technician_may_target());
    }

    #[test]
    fn test_sort_field_parsing() {
        assert_eq!(JobSortField::parse("created_at"), Some(JobSortField::CreatedAt));
        assert_eq!(JobSortField::parse("priority"), Some(JobSortField::Priority));
        assert_eq!(JobSortField::parse("title"), None);
    }
}
