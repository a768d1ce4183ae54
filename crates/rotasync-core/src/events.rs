use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ids::{ChatUserId, GroupId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DomainEvent {
    GroupMembershipReplaced(GroupMembershipReplaced),
    SupportFallbackUsed(SupportFallbackUsed),
}

impl DomainEvent {
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Self::GroupMembershipReplaced(e) => e.occurred_at,
            Self::SupportFallbackUsed(e) => e.occurred_at,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::GroupMembershipReplaced(_) => "group.membership_replaced",
            Self::SupportFallbackUsed(_) => "support.fallback_used",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMembershipReplaced {
    pub group_id: GroupId,
    pub previous: Vec<ChatUserId>,
    pub current: Vec<ChatUserId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupportFallbackUsed {
    /// Candidate the pick stands in for; `None` for a whole-batch fallback.
    pub replaced: Option<String>,
    pub picked: String,
    pub occurred_at: DateTime<Utc>,
}
