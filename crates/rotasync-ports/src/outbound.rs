use async_trait::async_trait;
use chrono::{DateTime, Utc};

use rotasync_core::ids::{ChatUserId, GroupId};
use rotasync_core::rotation::Rotation;

use crate::error::{NotifyError, PortError};
use crate::types::{Announcement, GroupMember, Page};

/// Answers "who is on call for this rotation at this instant", already
/// mapped to a chat-platform username.
#[async_trait]
pub trait OnCallProvider: Send + Sync {
    async fn who_is_on_call(
        &self,
        rotation: &Rotation,
        at: DateTime<Utc>,
    ) -> Result<String, PortError>;
    fn provider_name(&self) -> &'static str;
}

#[async_trait]
pub trait ChatDirectory: Send + Sync {
    async fn user_id_by_username(&self, username: &str) -> Result<ChatUserId, PortError>;
    async fn group_members(&self, group: &GroupId, page: Page)
        -> Result<Vec<GroupMember>, PortError>;
    async fn add_group_members(
        &self,
        group: &GroupId,
        members: &[ChatUserId],
    ) -> Result<(), PortError>;
    async fn remove_group_members(
        &self,
        group: &GroupId,
        members: &[ChatUserId],
    ) -> Result<(), PortError>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, announcement: &Announcement) -> Result<(), NotifyError>;
}
