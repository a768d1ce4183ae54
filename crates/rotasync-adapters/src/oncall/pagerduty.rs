use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use tracing::debug;

use rotasync_core::rotation::Rotation;
use rotasync_core::username;
use rotasync_ports::error::PortError;
use rotasync_ports::outbound::OnCallProvider;

use crate::http::{connection, decode, endpoint, expect_success};

pub const DEFAULT_BASE_URL: &str = "https://api.pagerduty.com";

/// Resolves on-call users through the PagerDuty REST API. Rotations are
/// schedule IDs; usernames are derived from the user's display name.
pub struct PagerDutyProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PagerDutyProvider {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
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
            .header("Authorization", format!("Token token={}", self.api_key))
            .header("Accept", "application/vnd.pagerduty+json;version=2")
            .send()
            .await
            .map_err(connection)?;
        decode(expect_success(response).await?).await
    }
}

#[async_trait]
impl OnCallProvider for PagerDutyProvider {
    async fn who_is_on_call(
        &self,
        rotation: &Rotation,
        at: DateTime<Utc>,
    ) -> Result<String, PortError> {
        let instant = at.to_rfc3339_opts(SecondsFormat::Secs, true);
        let listing: OnCallListing = self
            .get(
                &["oncalls"],
                &[
                    ("since", instant.as_str()),
                    ("until", instant.as_str()),
                    ("schedule_ids[]", rotation.schedule()),
                ],
            )
            .await?;

        let entry = listing
            .oncalls
            .into_iter()
            .next()
            .ok_or_else(|| PortError::NoOneOnCall(rotation.schedule().to_string()))?;

        let profile: UserEnvelope = self.get(&["users", entry.user.id.as_str()], &[]).await?;
        debug!(
            schedule = rotation.schedule(),
            name = %profile.user.name,
            email = %profile.user.email,
            "pagerduty on-call user"
        );

        if profile.user.name.trim().is_empty() {
            return Err(PortError::Decode(format!(
                "pagerduty user {} has no name",
                entry.user.id
            )));
        }
        Ok(username::from_display_name(profile.user.name.trim()))
    }

    fn provider_name(&self) -> &'static str {
        "pagerduty"
    }
}

#[derive(Debug, Deserialize)]
struct OnCallListing {
    #[serde(default)]
    oncalls: Vec<OnCallEntry>,
}

#[derive(Debug, Deserialize)]
struct OnCallEntry {
    user: UserRef,
}

#[derive(Debug, Deserialize)]
struct UserRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: UserProfile,
}

#[derive(Debug, Deserialize)]
struct UserProfile {
    name: String,
    #[serde(default)]
    email: String,
}
