use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{error, info};

use rotasync_core::events::DomainEvent;
use rotasync_core::ids::{ChatUserId, GroupId};
use rotasync_core::rotation::{later_instant, Horizon, OnCallAssignment, OnCallSnapshot, Rotation};
use rotasync_core::support::{SupportPolicy, SupportRoster};
use rotasync_ports::outbound::{ChatDirectory, Notifier, OnCallProvider};
use rotasync_ports::types::Announcement;

use crate::error::AppError;
use crate::reconciler::{GroupReconciler, ReconcileOutcome};

/// A chat group we keep in sync, plus where to announce changes to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpec {
    pub id: GroupId,
    pub webhook_url: String,
    pub handle: String,
}

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub primary: Rotation,
    pub secondary: Rotation,
    pub hour_shift: i64,
    pub policy: SupportPolicy,
    pub roster: SupportRoster,
    pub on_call_group: GroupSpec,
    pub support_group: GroupSpec,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupSync {
    pub outcome: ReconcileOutcome,
    pub notified: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub snapshot: OnCallSnapshot,
    pub support: Vec<String>,
    pub on_call: GroupSync,
    pub support_group: GroupSync,
}

pub struct RosterSyncService<P, C, N, R>
where
    P: OnCallProvider,
    C: ChatDirectory,
    N: Notifier,
    R: Rng + Send,
{
    provider: P,
    reconciler: GroupReconciler<C>,
    notifier: N,
    rng: Mutex<R>,
    settings: SyncSettings,
}

impl<P, C, N, R> RosterSyncService<P, C, N, R>
where
    P: OnCallProvider,
    C: ChatDirectory,
    N: Notifier,
    R: Rng + Send,
{
    pub fn new(provider: P, directory: C, notifier: N, rng: R, settings: SyncSettings) -> Self {
        Self {
            provider,
            reconciler: GroupReconciler::new(directory),
            notifier,
            rng: Mutex::new(rng),
            settings,
        }
    }

    /// One full pass. Lookup failures abort before anything is mutated;
    /// both groups are always attempted and their failures reported together.
    pub async fn sync(&self, now: DateTime<Utc>) -> Result<SyncReport, AppError> {
        let snapshot = self.snapshot(now).await?;

        let (support, support_events) = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            self.settings.roster.select(
                self.settings.policy,
                &snapshot.support_candidates(),
                &mut *rng,
                now,
            )?
        };
        log_events(&support_events);
        info!(
            policy = self.settings.policy.as_str(),
            support = %support.join(","),
            "support selected"
        );

        let on_call = self
            .sync_group(&self.settings.on_call_group, &snapshot.on_call_members(), now, |g, _| {
                Announcement::on_call(
                    &g.webhook_url,
                    &g.handle,
                    &snapshot.primary_now.username,
                    &snapshot.secondary_now.username,
                )
            })
            .await;

        let support_group = self
            .sync_group(&self.settings.support_group, &support, now, |g, members| {
                Announcement::support(&g.webhook_url, &g.handle, members)
            })
            .await;

        match (on_call, support_group) {
            (Ok(on_call), Ok(support_group)) => Ok(SyncReport {
                snapshot,
                support,
                on_call,
                support_group,
            }),
            (on_call, support_group) => Err(AppError::GroupsFailed(
                [on_call.err(), support_group.err()]
                    .into_iter()
                    .flatten()
                    .collect(),
            )),
        }
    }

    async fn snapshot(&self, now: DateTime<Utc>) -> Result<OnCallSnapshot, AppError> {
        let later = later_instant(now, self.settings.hour_shift)?;
        let primary_now = self.resolve(&self.settings.primary, Horizon::Now, now).await?;
        let secondary_now = self.resolve(&self.settings.secondary, Horizon::Now, now).await?;
        let primary_later = self.resolve(&self.settings.primary, Horizon::Later, later).await?;
        let secondary_later = self
            .resolve(&self.settings.secondary, Horizon::Later, later)
            .await?;

        Ok(OnCallSnapshot {
            primary_now,
            secondary_now,
            primary_later,
            secondary_later,
        })
    }

    async fn resolve(
        &self,
        rotation: &Rotation,
        horizon: Horizon,
        at: DateTime<Utc>,
    ) -> Result<OnCallAssignment, AppError> {
        let role = rotation.role().as_str();
        let username = self
            .provider
            .who_is_on_call(rotation, at)
            .await
            .map_err(|source| AppError::Lookup {
                role,
                horizon: horizon.as_str(),
                source,
            })?;

        info!(
            provider = self.provider.provider_name(),
            role,
            horizon = horizon.as_str(),
            username = %username,
            "resolved on-call"
        );

        Ok(OnCallAssignment {
            role: rotation.role(),
            horizon,
            at,
            username,
        })
    }

    async fn sync_group<F>(
        &self,
        group: &GroupSpec,
        target: &[String],
        now: DateTime<Utc>,
        announcement: F,
    ) -> Result<GroupSync, AppError>
    where
        F: FnOnce(&GroupSpec, &[String]) -> Announcement,
    {
        let outcome = match self.reconciler.reconcile(&group.id, target, now).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(group = %group.id, error = %e, "group reconciliation failed");
                return Err(e);
            }
        };
        log_events(&outcome.events);

        if !outcome.changed {
            return Ok(GroupSync {
                outcome,
                notified: false,
            });
        }

        let message = announcement(group, &outcome.members);
        if let Err(source) = self.notifier.notify(&message).await {
            error!(group = %group.id, error = %source, "notification failed");
            return Err(AppError::Notify {
                group: group.id.clone(),
                source,
            });
        }
        info!(group = %group.id, "change announced");

        Ok(GroupSync {
            outcome,
            notified: true,
        })
    }
}

fn log_events(events: &[DomainEvent]) {
    for event in events {
        match event {
            DomainEvent::GroupMembershipReplaced(e) => info!(
                event_type = event.event_type(),
                occurred_at = %e.occurred_at,
                group = %e.group_id,
                previous = %joined(&e.previous),
                current = %joined(&e.current),
                "domain event"
            ),
            DomainEvent::SupportFallbackUsed(e) => info!(
                event_type = event.event_type(),
                occurred_at = %e.occurred_at,
                replaced = %e.replaced.as_deref().unwrap_or("*"),
                picked = %e.picked,
                "domain event"
            ),
        }
    }
}

fn joined(ids: &[ChatUserId]) -> String {
    ids.iter().map(ChatUserId::as_str).collect::<Vec<_>>().join(",")
}
