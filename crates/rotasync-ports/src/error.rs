use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("no one is on call for schedule {0}")]
    NoOneOnCall(String),
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("connection error: {0}")]
    Connection(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    DeliveryFailed(String),
    #[error("webhook rejected payload with {status}: {body}")]
    Rejected { status: u16, body: String },
}
