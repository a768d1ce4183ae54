use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use rotasync_core::ids::{ChatUserId, GroupId};
use rotasync_core::rotation::Rotation;
use rotasync_ports::error::{NotifyError, PortError};
use rotasync_ports::outbound::{ChatDirectory, Notifier, OnCallProvider};
use rotasync_ports::types::{Announcement, GroupMember, Page};

pub fn ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

pub fn uid(s: &str) -> ChatUserId {
    ChatUserId::parse(s).unwrap()
}

pub fn gid(s: &str) -> GroupId {
    GroupId::parse(s).unwrap()
}

#[derive(Default)]
pub struct MockProvider {
    on_call: HashMap<(String, DateTime<Utc>), String>,
    pub lookups: Mutex<Vec<(String, DateTime<Utc>)>>,
}

impl MockProvider {
    pub fn with(mut self, schedule: &str, at: DateTime<Utc>, username: &str) -> Self {
        self.on_call
            .insert((schedule.to_string(), at), username.to_string());
        self
    }
}

#[async_trait]
impl OnCallProvider for MockProvider {
    async fn who_is_on_call(
        &self,
        rotation: &Rotation,
        at: DateTime<Utc>,
    ) -> Result<String, PortError> {
        self.lookups
            .lock()
            .unwrap()
            .push((rotation.schedule().to_string(), at));
        self.on_call
            .get(&(rotation.schedule().to_string(), at))
            .cloned()
            .ok_or_else(|| PortError::NoOneOnCall(rotation.schedule().to_string()))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// In-memory chat platform. Every mutating call is recorded.
#[derive(Default)]
pub struct MockDirectory {
    users: HashMap<String, ChatUserId>,
    groups: Mutex<HashMap<GroupId, Vec<ChatUserId>>>,
    pub mutations: Mutex<Vec<String>>,
    pub fail_add: bool,
}

impl MockDirectory {
    pub fn user(mut self, username: &str, id: &str) -> Self {
        self.users.insert(username.to_string(), uid(id));
        self
    }

    pub fn group(self, group: &str, members: &[&str]) -> Self {
        self.groups
            .lock()
            .unwrap()
            .insert(gid(group), members.iter().map(|m| uid(m)).collect());
        self
    }

    pub fn members_of(&self, group: &str) -> Vec<String> {
        self.groups
            .lock()
            .unwrap()
            .get(&gid(group))
            .map(|ids| ids.iter().map(|i| i.to_string()).collect())
            .unwrap_or_default()
    }

    pub fn mutation_count(&self) -> usize {
        self.mutations.lock().unwrap().len()
    }

    fn username_of(&self, id: &ChatUserId) -> String {
        self.users
            .iter()
            .find(|(_, v)| *v == id)
            .map(|(k, _)| k.clone())
            .unwrap_or_else(|| id.to_string())
    }
}

fn joined(ids: &[ChatUserId]) -> String {
    ids.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(",")
}

#[async_trait]
impl ChatDirectory for MockDirectory {
    async fn user_id_by_username(&self, username: &str) -> Result<ChatUserId, PortError> {
        self.users
            .get(username)
            .cloned()
            .ok_or_else(|| PortError::NotFound(username.to_string()))
    }

    async fn group_members(
        &self,
        group: &GroupId,
        page: Page,
    ) -> Result<Vec<GroupMember>, PortError> {
        let ids = self
            .groups
            .lock()
            .unwrap()
            .get(group)
            .cloned()
            .unwrap_or_default();
        Ok(ids
            .into_iter()
            .take(page.per_page as usize)
            .map(|id| {
                let username = self.username_of(&id);
                GroupMember {
                    id,
                    first_name: username.clone(),
                    last_name: "test".into(),
                    username,
                }
            })
            .collect())
    }

    async fn add_group_members(
        &self,
        group: &GroupId,
        members: &[ChatUserId],
    ) -> Result<(), PortError> {
        if self.fail_add {
            return Err(PortError::Upstream {
                status: 500,
                body: "boom".into(),
            });
        }
        self.mutations
            .lock()
            .unwrap()
            .push(format!("add {group} {}", joined(members)));
        let mut groups = self.groups.lock().unwrap();
        let entry = groups.entry(group.clone()).or_default();
        for m in members {
            if !entry.contains(m) {
                entry.push(m.clone());
            }
        }
        Ok(())
    }

    async fn remove_group_members(
        &self,
        group: &GroupId,
        members: &[ChatUserId],
    ) -> Result<(), PortError> {
        self.mutations
            .lock()
            .unwrap()
            .push(format!("remove {group} {}", joined(members)));
        let mut groups = self.groups.lock().unwrap();
        if let Some(entry) = groups.get_mut(group) {
            entry.retain(|m| !members.contains(m));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MockNotifier {
    pub sent: Mutex<Vec<Announcement>>,
    pub fail: bool,
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, announcement: &Announcement) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Rejected {
                status: 500,
                body: "down".into(),
            });
        }
        self.sent.lock().unwrap().push(announcement.clone());
        Ok(())
    }
}
