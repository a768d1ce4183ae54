//! Incoming-webhook delivery of roster announcements.
//!
//! The payload is the Slack-compatible attachment format that Mattermost
//! incoming webhooks accept.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use rotasync_ports::error::NotifyError;
use rotasync_ports::outbound::Notifier;
use rotasync_ports::types::Announcement;

pub struct WebhookNotifier {
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn format_payload(announcement: &Announcement) -> WebhookPayload {
        let mut fields = vec![WebhookField {
            title: announcement.heading.clone(),
            value: String::new(),
            short: false,
        }];
        for (role, member) in &announcement.roles {
            fields.push(WebhookField {
                title: role.clone(),
                value: member.clone(),
                short: true,
            });
        }
        fields.push(WebhookField {
            title: String::new(),
            value: announcement.footer.clone(),
            short: false,
        });

        WebhookPayload {
            username: announcement.sender.clone(),
            icon_url: announcement.icon_url.clone(),
            attachments: vec![WebhookAttachment {
                fallback: announcement.title.clone(),
                title: announcement.title.clone(),
                title_link: announcement.title_link.clone(),
                color: announcement.color.clone(),
                fields,
            }],
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, announcement: &Announcement) -> Result<(), NotifyError> {
        let payload = Self::format_payload(announcement);

        debug!(kind = ?announcement.kind, title = %announcement.title, "Sending announcement");

        let response = self
            .client
            .post(&announcement.target)
            .header("X-Custom-Header", "aws-sns")
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::DeliveryFailed(e.to_string()))?;

        if response.status().is_success() {
            debug!(kind = ?announcement.kind, "Announcement delivered");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            warn!(
                kind = ?announcement.kind,
                status = %status,
                body = %body,
                "Webhook request failed"
            );

            Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload {
    username: String,
    icon_url: String,
    attachments: Vec<WebhookAttachment>,
}

#[derive(Debug, Serialize)]
struct WebhookAttachment {
    fallback: String,
    title: String,
    title_link: String,
    color: String,
    fields: Vec<WebhookField>,
}

#[derive(Debug, Serialize)]
struct WebhookField {
    #[serde(skip_serializing_if = "String::is_empty")]
    title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    value: String,
    short: bool,
}
