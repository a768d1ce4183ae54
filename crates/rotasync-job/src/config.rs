//! Environment configuration for a sync run.
//!
//! Everything is read and validated once, before any network call. Missing
//! required variables are reported together rather than one per run.

use std::time::Duration;

use thiserror::Error;

use rotasync_adapters::oncall::{opsgenie, pagerduty};
use rotasync_app::sync_service::{GroupSpec, SyncSettings};
use rotasync_core::ids::GroupId;
use rotasync_core::rotation::{Rotation, RotationRole, MAX_HOUR_SHIFT};
use rotasync_core::support::{SupportPolicy, SupportRoster};
use rotasync_core::username;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<String>),
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    PagerDuty,
    Opsgenie,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PagerDuty => "pagerduty",
            Self::Opsgenie => "opsgenie",
        }
    }

    fn api_key_var(&self) -> &'static str {
        match self {
            Self::PagerDuty => "PAGERDUTY_APIKEY",
            Self::Opsgenie => "OPSGENIE_APIKEY",
        }
    }

    /// Each provider's program shipped with its own support policy.
    fn default_policy(&self) -> SupportPolicy {
        match self {
            Self::PagerDuty => SupportPolicy::WholeBatch,
            Self::Opsgenie => SupportPolicy::PerCandidate,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub provider: Provider,
    pub provider_api_key: String,
    pub provider_api_url: String,
    pub username_detail: String,
    pub mattermost_url: String,
    pub mattermost_token: String,
    pub on_call_group: GroupSpec,
    pub support_group: GroupSpec,
    pub hour_shift: i64,
    pub primary: Rotation,
    pub secondary: Rotation,
    pub support_policy: SupportPolicy,
    pub roster: SupportRoster,
    pub http_timeout: Duration,
    pub run_deadline: Duration,
}

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
const DEFAULT_RUN_DEADLINE_SECS: u64 = 120;

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env = Env {
            lookup,
            missing: vec![],
        };

        let provider = match env.optional("ONCALL_PROVIDER").map(|p| p.to_lowercase()) {
            None => Provider::PagerDuty,
            Some(p) if p == "pagerduty" => Provider::PagerDuty,
            Some(p) if p == "opsgenie" => Provider::Opsgenie,
            Some(other) => {
                return Err(invalid("ONCALL_PROVIDER", format!("unknown provider {other}")));
            }
        };

        let provider_api_key = env.required(provider.api_key_var());
        let mattermost_url = env.required("MATTERMOST_URL");
        let mattermost_token = env.required("MATTERMOST_BOT_TOKEN");
        let on_call_group_id = env.required("MATTERMOST_SREONCALL_GROUPID");
        let support_group_id = env.required("MATTERMOST_SRESUPPORT_GROUPID");
        let on_call_hook = env.required("MATTERMOST_SREONCALL_NOTIFICATION_HOOK");
        let support_hook = env.required("MATTERMOST_SRESUPPORT_NOTIFICATION_HOOK");
        let hour_shift = env.required("ONCALL_HOUR_SHIFTS");
        let primary = env.required("PRIMARY_SCHEDULE_ID");
        let secondary = env.required("SECONDARY_SCHEDULE_ID");
        let approved = env.required("SUPPORT_APPROVED_LIST");
        let overrides = env.required("SUPPORT_OVERRIDE_LIST");

        if !env.missing.is_empty() {
            return Err(ConfigError::Missing(env.missing));
        }

        let hour_shift = hour_shift
            .parse::<i64>()
            .map_err(|e| invalid("ONCALL_HOUR_SHIFTS", e.to_string()))?;
        if hour_shift.unsigned_abs() > MAX_HOUR_SHIFT.unsigned_abs() {
            return Err(invalid(
                "ONCALL_HOUR_SHIFTS",
                format!("must be within +/-{MAX_HOUR_SHIFT} hours"),
            ));
        }

        let overrides = username::parse_list(&overrides);
        if overrides.is_empty() {
            return Err(invalid("SUPPORT_OVERRIDE_LIST", "no usernames listed".into()));
        }

        let support_policy = match env.optional("SUPPORT_POLICY") {
            None => provider.default_policy(),
            Some(raw) => SupportPolicy::parse(&raw)
                .ok_or_else(|| invalid("SUPPORT_POLICY", format!("unknown policy {raw}")))?,
        };

        let (url_var, default_url) = match provider {
            Provider::PagerDuty => ("PAGERDUTY_API_URL", pagerduty::DEFAULT_BASE_URL),
            Provider::Opsgenie => ("OPSGENIE_API_URL", opsgenie::DEFAULT_BASE_URL),
        };

        Ok(Self {
            provider,
            provider_api_key,
            provider_api_url: env.optional(url_var).unwrap_or_else(|| default_url.into()),
            username_detail: env
                .optional("OPSGENIE_USERNAME_DETAIL")
                .unwrap_or_else(|| opsgenie::DEFAULT_USERNAME_DETAIL.into()),
            mattermost_url,
            mattermost_token,
            on_call_group: GroupSpec {
                id: group_id("MATTERMOST_SREONCALL_GROUPID", &on_call_group_id)?,
                webhook_url: on_call_hook,
                handle: env
                    .optional("ONCALL_GROUP_HANDLE")
                    .unwrap_or_else(|| "sreoncall".into()),
            },
            support_group: GroupSpec {
                id: group_id("MATTERMOST_SRESUPPORT_GROUPID", &support_group_id)?,
                webhook_url: support_hook,
                handle: env
                    .optional("SUPPORT_GROUP_HANDLE")
                    .unwrap_or_else(|| "sresupport".into()),
            },
            hour_shift,
            primary: rotation("PRIMARY_SCHEDULE_ID", primary, RotationRole::Primary)?,
            secondary: rotation("SECONDARY_SCHEDULE_ID", secondary, RotationRole::Secondary)?,
            support_policy,
            roster: SupportRoster::new(username::parse_list(&approved), overrides),
            http_timeout: Duration::from_secs(
                env.seconds("HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
            ),
            run_deadline: Duration::from_secs(
                env.seconds("RUN_DEADLINE_SECS", DEFAULT_RUN_DEADLINE_SECS)?,
            ),
        })
    }

    pub fn settings(&self) -> SyncSettings {
        SyncSettings {
            primary: self.primary.clone(),
            secondary: self.secondary.clone(),
            hour_shift: self.hour_shift,
            policy: self.support_policy,
            roster: self.roster.clone(),
            on_call_group: self.on_call_group.clone(),
            support_group: self.support_group.clone(),
        }
    }
}

struct Env<F> {
    lookup: F,
    missing: Vec<String>,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&mut self, key: &str) -> String {
        match self.optional(key) {
            Some(value) => value,
            None => {
                self.missing.push(key.to_string());
                String::new()
            }
        }
    }

    fn seconds(&self, key: &str, default: u64) -> Result<u64, ConfigError> {
        match self.optional(key) {
            None => Ok(default),
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => Err(invalid(key, "must be greater than zero".into())),
                Ok(secs) => Ok(secs),
                Err(e) => Err(invalid(key, e.to_string())),
            },
        }
    }
}

fn invalid(var: &str, reason: String) -> ConfigError {
    ConfigError::Invalid {
        var: var.to_string(),
        reason,
    }
}

fn group_id(var: &str, raw: &str) -> Result<GroupId, ConfigError> {
    GroupId::parse(raw).map_err(|e| invalid(var, e.to_string()))
}

fn rotation(var: &str, raw: String, role: RotationRole) -> Result<Rotation, ConfigError> {
    Rotation::new(raw, role).map_err(|e| invalid(var, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("PAGERDUTY_APIKEY", "pd-key"),
            ("MATTERMOST_URL", "https://chat.example.com"),
            ("MATTERMOST_BOT_TOKEN", "bot-token"),
            ("MATTERMOST_SREONCALL_GROUPID", "g-oncall"),
            ("MATTERMOST_SRESUPPORT_GROUPID", "g-support"),
            ("MATTERMOST_SREONCALL_NOTIFICATION_HOOK", "https://chat.example.com/hooks/a"),
            ("MATTERMOST_SRESUPPORT_NOTIFICATION_HOOK", "https://chat.example.com/hooks/b"),
            ("ONCALL_HOUR_SHIFTS", "12"),
            ("PRIMARY_SCHEDULE_ID", "PPRIMARY"),
            ("SECONDARY_SCHEDULE_ID", "PSECOND"),
            ("SUPPORT_APPROVED_LIST", "bob, carol"),
            ("SUPPORT_OVERRIDE_LIST", "dave,erin"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<Config, ConfigError> {
        Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn loads_pagerduty_defaults() {
        let config = load(&base()).unwrap();

        assert_eq!(config.provider, Provider::PagerDuty);
        assert_eq!(config.provider_api_url, pagerduty::DEFAULT_BASE_URL);
        assert_eq!(config.support_policy, SupportPolicy::WholeBatch);
        assert_eq!(config.hour_shift, 12);
        assert_eq!(config.primary.schedule(), "PPRIMARY");
        assert_eq!(config.secondary.role(), RotationRole::Secondary);
        assert_eq!(config.roster.approved, vec!["bob", "carol"]);
        assert_eq!(config.roster.overrides, vec!["dave", "erin"]);
        assert_eq!(config.on_call_group.handle, "sreoncall");
        assert_eq!(config.http_timeout, Duration::from_secs(15));
        assert_eq!(config.run_deadline, Duration::from_secs(120));
    }

    #[test]
    fn reports_every_missing_variable() {
        let mut vars = base();
        vars.remove("MATTERMOST_URL");
        vars.remove("SUPPORT_OVERRIDE_LIST");
        vars.insert("ONCALL_HOUR_SHIFTS", "   ");

        let err = load(&vars).unwrap_err();

        assert_eq!(
            err,
            ConfigError::Missing(vec![
                "MATTERMOST_URL".into(),
                "ONCALL_HOUR_SHIFTS".into(),
                "SUPPORT_OVERRIDE_LIST".into(),
            ])
        );
    }

    #[test]
    fn opsgenie_needs_its_own_key() {
        let mut vars = base();
        vars.insert("ONCALL_PROVIDER", "opsgenie");

        let err = load(&vars).unwrap_err();
        assert_eq!(err, ConfigError::Missing(vec!["OPSGENIE_APIKEY".into()]));

        vars.insert("OPSGENIE_APIKEY", "og-key");
        let config = load(&vars).unwrap();
        assert_eq!(config.provider, Provider::Opsgenie);
        assert_eq!(config.support_policy, SupportPolicy::PerCandidate);
        assert_eq!(config.username_detail, "mattermost_username");
    }

    #[test]
    fn policy_can_be_overridden() {
        let mut vars = base();
        vars.insert("SUPPORT_POLICY", "per-candidate");
        assert_eq!(load(&vars).unwrap().support_policy, SupportPolicy::PerCandidate);

        vars.insert("SUPPORT_POLICY", "coin-flip");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { var, .. }) if var == "SUPPORT_POLICY"
        ));
    }

    #[test]
    fn rejects_non_numeric_hour_shift() {
        let mut vars = base();
        vars.insert("ONCALL_HOUR_SHIFTS", "twelve");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { var, .. }) if var == "ONCALL_HOUR_SHIFTS"
        ));
    }

    #[test]
    fn rejects_hour_shift_beyond_a_year() {
        for raw in ["3000000000", "9223372036854775807", "-9223372036854775808"] {
            let mut vars = base();
            vars.insert("ONCALL_HOUR_SHIFTS", raw);
            assert!(matches!(
                load(&vars),
                Err(ConfigError::Invalid { var, .. }) if var == "ONCALL_HOUR_SHIFTS"
            ));
        }

        let mut vars = base();
        vars.insert("ONCALL_HOUR_SHIFTS", "-48");
        assert_eq!(load(&vars).unwrap().hour_shift, -48);
    }

    #[test]
    fn rejects_override_list_without_names() {
        let mut vars = base();
        vars.insert("SUPPORT_OVERRIDE_LIST", " , ,");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { var, .. }) if var == "SUPPORT_OVERRIDE_LIST"
        ));
    }

    #[test]
    fn rejects_unknown_provider() {
        let mut vars = base();
        vars.insert("ONCALL_PROVIDER", "victorops");
        assert!(matches!(load(&vars), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut vars = base();
        vars.insert("HTTP_TIMEOUT_SECS", "0");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { var, .. }) if var == "HTTP_TIMEOUT_SECS"
        ));
    }
}
