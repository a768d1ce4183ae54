use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use rotasync_core::rotation::Rotation;
use rotasync_ports::error::PortError;
use rotasync_ports::outbound::OnCallProvider;

use crate::http::{connection, decode, endpoint, expect_success};

pub const DEFAULT_BASE_URL: &str = "https://api.opsgenie.com";
pub const DEFAULT_USERNAME_DETAIL: &str = "mattermost_username";

/// Resolves on-call users through the Opsgenie API. Rotations are schedule
/// names. The chat username comes from a custom user detail, then the
/// full name, then the raw recipient.
pub struct OpsgenieProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    username_detail: String,
}

impl OpsgenieProvider {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        username_detail: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            username_detail: username_detail.into(),
        }
    }

    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T, PortError> {
        let url = endpoint(&self.base_url, segments)?;
        let response = self
            .client
            .get(url)
            .query(query)
            .header("Authorization", format!("GenieKey {}", self.api_key))
            .send()
            .await
            .map_err(connection)?;
        decode(expect_success(response).await?).await
    }

    async fn chat_username(&self, recipient: &str) -> String {
        let profile: Result<Envelope<UserProfile>, PortError> = self
            .get(&["v2", "users", recipient], &[("expand", "details")])
            .await;

        match profile {
            Ok(Envelope { data: user }) => {
                debug!(full_name = %user.full_name, username = %user.username, "opsgenie user");
                user.details
                    .get(&self.username_detail)
                    .and_then(|values| values.first())
                    .filter(|value| !value.trim().is_empty())
                    .cloned()
                    .unwrap_or(user.full_name)
            }
            Err(e) => {
                warn!(recipient, error = %e, "opsgenie user lookup failed, using recipient");
                recipient.to_string()
            }
        }
    }
}

#[async_trait]
impl OnCallProvider for OpsgenieProvider {
    async fn who_is_on_call(
        &self,
        rotation: &Rotation,
        at: DateTime<Utc>,
    ) -> Result<String, PortError> {
        let date = at.to_rfc3339_opts(SecondsFormat::Secs, true);
        let on_calls: Envelope<OnCalls> = self
            .get(
                &["v2", "schedules", rotation.schedule(), "on-calls"],
                &[
                    ("scheduleIdentifierType", "name"),
                    ("flat", "true"),
                    ("date", date.as_str()),
                ],
            )
            .await?;

        let recipient = on_calls
            .data
            .on_call_recipients
            .into_iter()
            .next()
            .ok_or_else(|| PortError::NoOneOnCall(rotation.schedule().to_string()))?;

        let username = self.chat_username(&recipient).await;
        if username.trim().is_empty() {
            return Err(PortError::Decode(format!(
                "opsgenie user {recipient} has no chat username"
            )));
        }
        Ok(username)
    }

    fn provider_name(&self) -> &'static str {
        "opsgenie"
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OnCalls {
    #[serde(default)]
    on_call_recipients: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserProfile {
    #[serde(default)]
    username: String,
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    details: HashMap<String, Vec<String>>,
}
