//! rotasync
//!
//! A batch job, normally run from cron, that keeps two chat groups in line
//! with the on-call schedule:
//!
//! - **@sreoncall**: whoever is primary and secondary on call right now
//! - **@sresupport**: the secondaries for now and later, filtered through
//!   the approved support list, with a random override when needed
//!
//! Each run resolves the rotations, reconciles both groups, announces any
//! change on the group's webhook, and exits non-zero if anything failed.

use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info, info_span, Instrument};

use rotasync_adapters::chat::MattermostDirectory;
use rotasync_adapters::http;
use rotasync_adapters::notify::WebhookNotifier;
use rotasync_adapters::oncall::{OpsgenieProvider, PagerDutyProvider};
use rotasync_app::sync_service::RosterSyncService;
use rotasync_core::ids::RunId;
use rotasync_ports::outbound::OnCallProvider;

mod config;
mod telemetry;

use config::{Config, Provider};

#[tokio::main]
async fn main() -> ExitCode {
    // Local runs may keep their variables in a .env file
    dotenvy::dotenv().ok();
    telemetry::init();

    info!("Starting oncall roster sync");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Roster sync failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;
    let client = http::client(config.http_timeout).context("failed to build HTTP client")?;

    let run_id = RunId::new();
    let span = info_span!("sync", run_id = %run_id, provider = config.provider.as_str());
    info!(
        run_id = %run_id,
        provider = config.provider.as_str(),
        hour_shift = config.hour_shift,
        policy = config.support_policy.as_str(),
        "Configuration loaded"
    );

    let deadline = config.run_deadline;
    let sync = async {
        match config.provider {
            Provider::PagerDuty => {
                let provider = PagerDutyProvider::new(
                    client.clone(),
                    &config.provider_api_url,
                    &config.provider_api_key,
                );
                sync_with(provider, &config, client).await
            }
            Provider::Opsgenie => {
                let provider = OpsgenieProvider::new(
                    client.clone(),
                    &config.provider_api_url,
                    &config.provider_api_key,
                    &config.username_detail,
                );
                sync_with(provider, &config, client).await
            }
        }
    }
    .instrument(span);

    tokio::time::timeout(deadline, sync)
        .await
        .map_err(|_| anyhow!("run exceeded deadline of {}s", deadline.as_secs()))?
}

async fn sync_with<P>(provider: P, config: &Config, client: reqwest::Client) -> Result<()>
where
    P: OnCallProvider,
{
    let directory = MattermostDirectory::new(
        client.clone(),
        &config.mattermost_url,
        &config.mattermost_token,
    );
    let notifier = WebhookNotifier::new(client);
    let service = RosterSyncService::new(
        provider,
        directory,
        notifier,
        StdRng::from_os_rng(),
        config.settings(),
    );

    let report = service
        .sync(Utc::now())
        .await
        .context("roster sync did not complete")?;

    info!(
        primary_now = %report.snapshot.primary_now.username,
        secondary_now = %report.snapshot.secondary_now.username,
        support = %report.support.join(","),
        on_call_changed = report.on_call.outcome.changed,
        support_changed = report.support_group.outcome.changed,
        "Roster sync complete"
    );

    Ok(())
}
