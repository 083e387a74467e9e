use crate::shared::entity::{Entity, ID};
use serde::{Deserialize, Serialize};

/// What a notification is about, which decides both the message
/// template used by the (external) renderer and the timing offset
/// that applies when it is derived from a `Course`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Sent the day before a course, at the user's configured hour
    Preparation,
    /// Sent ahead of the departure towards the first stop
    Departure,
    /// Sent between two stops of the same course
    Move,
    /// Sent when a course changed after notifications were scheduled
    UrgentChange,
}

impl NotificationKind {
    /// Relative weight of this kind when estimating engagement
    /// probability. Departure and change notifications historically
    /// get opened more than preparation ones.
    pub fn engagement_multiplier(&self) -> f64 {
        match self {
            NotificationKind::Preparation => 1.0,
            NotificationKind::Departure => 1.2,
            NotificationKind::Move => 0.9,
            NotificationKind::UrgentChange => 1.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Normal,
    High,
    /// Urgent notifications bypass quiet hours and the weekly
    /// frequency ceiling
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Draft,
    Scheduled,
    Sending,
    Sent,
    Failed,
    Cancelled,
}

impl NotificationStatus {
    /// Status transitions only move forward. `Sent`, `Failed` and
    /// `Cancelled` are terminal.
    pub fn can_transition_to(&self, next: NotificationStatus) -> bool {
        use NotificationStatus::*;
        match (self, next) {
            (Draft, Scheduled) => true,
            (Scheduled, Sending) => true,
            (Scheduled, Cancelled) => true,
            (Sending, Sent) => true,
            (Sending, Failed) => true,
            _ => false,
        }
    }
}

/// A notification that has been (or is about to be) committed to the
/// delay queue, to be delivered at `scheduled_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledNotification {
    pub id: ID,
    pub user_id: ID,
    pub course_id: Option<ID>,
    pub kind: NotificationKind,
    pub priority: Priority,
    /// Unix timestamp in millis at which delivery should happen
    pub scheduled_at: i64,
    pub message: String,
    pub deep_link: Option<String>,
    pub status: NotificationStatus,
    pub created: i64,
    pub updated: i64,
}

impl ScheduledNotification {
    pub fn new(
        user_id: ID,
        kind: NotificationKind,
        priority: Priority,
        scheduled_at: i64,
        message: String,
        now: i64,
    ) -> Self {
        Self {
            id: Default::default(),
            user_id,
            course_id: None,
            kind,
            priority,
            scheduled_at,
            message,
            deep_link: None,
            status: NotificationStatus::Draft,
            created: now,
            updated: now,
        }
    }

    /// Moves the notification to `next` if the state machine allows
    /// it. Returns `false` and leaves the status untouched otherwise.
    pub fn transition_to(&mut self, next: NotificationStatus, now: i64) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.updated = now;
        true
    }
}

impl Entity for ScheduledNotification {
    fn id(&self) -> &ID {
        &self.id
    }
}
