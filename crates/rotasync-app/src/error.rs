use rotasync_core::error::DomainError;
use rotasync_core::ids::GroupId;
use rotasync_ports::error::{NotifyError, PortError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("{role} on-call lookup ({horizon}) failed: {source}")]
    Lookup {
        role: &'static str,
        horizon: &'static str,
        source: PortError,
    },
    #[error("reconciling group {group} failed: {source}")]
    Reconcile { group: GroupId, source: PortError },
    #[error("notifying about group {group} failed: {source}")]
    Notify { group: GroupId, source: NotifyError },
    #[error("group sync failed: {}", join(.0))]
    GroupsFailed(Vec<AppError>),
}

fn join(errors: &[AppError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
