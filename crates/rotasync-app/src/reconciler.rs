use chrono::{DateTime, Utc};
use tracing::{debug, info};

use rotasync_core::events::{DomainEvent, GroupMembershipReplaced};
use rotasync_core::ids::{ChatUserId, GroupId};
use rotasync_core::membership::same_members;
use rotasync_core::username;
use rotasync_ports::error::PortError;
use rotasync_ports::outbound::ChatDirectory;
use rotasync_ports::types::Page;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    pub group: GroupId,
    /// Target usernames after de-duplication.
    pub members: Vec<String>,
    pub changed: bool,
    pub events: Vec<DomainEvent>,
}

/// Makes a chat group's membership exactly match a list of usernames.
///
/// A mismatch is fixed by clearing the group and re-adding the whole
/// target, not by a minimal diff. Between the two calls the group is
/// empty, and if the add fails the group stays empty until the next run.
pub struct GroupReconciler<C>
where
    C: ChatDirectory,
{
    directory: C,
}

impl<C> GroupReconciler<C>
where
    C: ChatDirectory,
{
    pub fn new(directory: C) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &C {
        &self.directory
    }

    pub async fn reconcile(
        &self,
        group: &GroupId,
        target: &[String],
        now: DateTime<Utc>,
    ) -> Result<ReconcileOutcome, AppError> {
        let wrap = |source: PortError| AppError::Reconcile {
            group: group.clone(),
            source,
        };

        // Groups hold a user once, so a repeated name would never compare equal.
        // ["dave", "dave"] therefore becomes a one-member group.
        let members = username::unique(target);

        let mut target_ids = Vec::with_capacity(members.len());
        for name in &members {
            let id = self
                .directory
                .user_id_by_username(name)
                .await
                .map_err(wrap)?;
            target_ids.push(id);
        }

        let current = self
            .directory
            .group_members(group, Page::default())
            .await
            .map_err(wrap)?;
        for member in &current {
            debug!(group = %group, member = %member.display_name(), "current group member");
        }
        let current_ids: Vec<ChatUserId> = current.into_iter().map(|m| m.id).collect();

        if same_members(&current_ids, &target_ids) {
            info!(group = %group, "group already in sync");
            return Ok(ReconcileOutcome {
                group: group.clone(),
                members,
                changed: false,
                events: vec![],
            });
        }

        if !current_ids.is_empty() {
            info!(group = %group, count = current_ids.len(), "clearing group members");
            self.directory
                .remove_group_members(group, &current_ids)
                .await
                .map_err(wrap)?;
        }

        if !target_ids.is_empty() {
            info!(group = %group, members = %members.join(","), "setting group members");
            self.directory
                .add_group_members(group, &target_ids)
                .await
                .map_err(wrap)?;
        }

        let event = DomainEvent::GroupMembershipReplaced(GroupMembershipReplaced {
            group_id: group.clone(),
            previous: current_ids,
            current: target_ids,
            occurred_at: now,
        });

        Ok(ReconcileOutcome {
            group: group.clone(),
            members,
            changed: true,
            events: vec![event],
        })
    }
}
