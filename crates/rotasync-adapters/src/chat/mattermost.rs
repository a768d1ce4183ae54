use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use rotasync_core::ids::{ChatUserId, GroupId};
use rotasync_ports::error::PortError;
use rotasync_ports::outbound::ChatDirectory;
use rotasync_ports::types::{GroupMember, Page};

use crate::http::{connection, decode, endpoint, expect_success};

/// Mattermost API v4, authenticated with a bot token.
pub struct MattermostDirectory {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl MattermostDirectory {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    fn request(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<reqwest::RequestBuilder, PortError> {
        let mut path = vec!["api", "v4"];
        path.extend_from_slice(segments);
        let url = endpoint(&self.base_url, &path)?;
        Ok(self.client.request(method, url).bearer_auth(&self.token))
    }

    async fn modify_members(
        &self,
        method: Method,
        group: &GroupId,
        members: &[ChatUserId],
    ) -> Result<(), PortError> {
        let body = ModifyMembers {
            user_ids: members.iter().map(|m| m.as_str()).collect(),
        };
        let response = self
            .request(method, &["groups", group.as_str(), "members"])?
            .json(&body)
            .send()
            .await
            .map_err(connection)?;
        expect_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl ChatDirectory for MattermostDirectory {
    async fn user_id_by_username(&self, username: &str) -> Result<ChatUserId, PortError> {
        let response = self
            .request(Method::GET, &["users", "username", username])?
            .send()
            .await
            .map_err(connection)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(PortError::NotFound(format!("mattermost user {username}")));
        }
        let user: User = decode(expect_success(response).await?).await?;
        ChatUserId::parse(&user.id).map_err(|e| PortError::Decode(e.to_string()))
    }

    async fn group_members(
        &self,
        group: &GroupId,
        page: Page,
    ) -> Result<Vec<GroupMember>, PortError> {
        let response = self
            .request(Method::GET, &["users"])?
            .query(&[
                ("in_group", group.as_str().to_string()),
                ("page", page.page.to_string()),
                ("per_page", page.per_page.to_string()),
            ])
            .send()
            .await
            .map_err(connection)?;
        let users: Vec<User> = decode(expect_success(response).await?).await?;
        debug!(group = %group, count = users.len(), "fetched group members");

        users.into_iter().map(User::into_member).collect()
    }

    async fn add_group_members(
        &self,
        group: &GroupId,
        members: &[ChatUserId],
    ) -> Result<(), PortError> {
        self.modify_members(Method::POST, group, members).await
    }

    async fn remove_group_members(
        &self,
        group: &GroupId,
        members: &[ChatUserId],
    ) -> Result<(), PortError> {
        self.modify_members(Method::DELETE, group, members).await
    }
}

#[derive(Debug, Deserialize)]
struct User {
    id: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
}

impl User {
    fn into_member(self) -> Result<GroupMember, PortError> {
        Ok(GroupMember {
            id: ChatUserId::parse(&self.id).map_err(|e| PortError::Decode(e.to_string()))?,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
        })
    }
}

#[derive(Debug, Serialize)]
struct ModifyMembers<'a> {
    user_ids: Vec<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn directory(server: &MockServer) -> MattermostDirectory {
        let client = crate::http::client(Duration::from_secs(5)).unwrap();
        MattermostDirectory::new(client, server.uri(), "bot-token")
    }

    fn ids(list: &[&str]) -> Vec<ChatUserId> {
        list.iter().map(|s| ChatUserId::parse(s).unwrap()).collect()
    }

    #[tokio::test]
    async fn looks_up_user_id_by_username() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/users/username/alice.smith"))
            .and(header("Authorization", "Bearer bot-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "u-alice", "username": "alice.smith"
            })))
            .mount(&server)
            .await;

        let id = directory(&server).user_id_by_username("alice.smith").await.unwrap();
        assert_eq!(id.as_str(), "u-alice");
    }

    #[tokio::test]
    async fn unknown_username_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/users/username/ghost"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = directory(&server).user_id_by_username("ghost").await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn lists_group_members_with_paging() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/users"))
            .and(query_param("in_group", "g-oncall"))
            .and(query_param("page", "0"))
            .and(query_param("per_page", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "u-alice", "username": "alice.smith", "first_name": "Alice", "last_name": "Smith"},
                {"id": "u-carol", "username": "carol.white", "first_name": "Carol", "last_name": "White"}
            ])))
            .mount(&server)
            .await;

        let members = directory(&server)
            .group_members(&GroupId::parse("g-oncall").unwrap(), Page::default())
            .await
            .unwrap();

        assert_eq!(members.len(), 2);
        assert_eq!(members[0].id.as_str(), "u-alice");
        assert_eq!(members[1].display_name(), "carol.white");
    }

    #[tokio::test]
    async fn adds_and_removes_members() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v4/groups/g-oncall/members"))
            .and(body_json(json!({"user_ids": ["u-alice", "u-bob"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/v4/groups/g-oncall/members"))
            .and(body_json(json!({"user_ids": ["u-carol"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let dir = directory(&server);
        let group = GroupId::parse("g-oncall").unwrap();
        dir.remove_group_members(&group, &ids(&["u-carol"])).await.unwrap();
        dir.add_group_members(&group, &ids(&["u-alice", "u-bob"])).await.unwrap();
    }

    #[tokio::test]
    async fn failed_mutation_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v4/groups/g-oncall/members"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let err = directory(&server)
            .add_group_members(&GroupId::parse("g-oncall").unwrap(), &ids(&["u-alice"]))
            .await
            .unwrap_err();

        assert!(matches!(err, PortError::Upstream { status: 403, ref body } if body == "forbidden"));
    }
}
