pub mod opsgenie;
pub mod pagerduty;

pub use opsgenie::OpsgenieProvider;
pub use pagerduty::PagerDutyProvider;
