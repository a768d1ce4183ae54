use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("rotation requires a schedule identifier")]
    EmptyRotationId,
    #[error("support fallback requires a non-empty override list")]
    EmptyOverrideList,
    #[error("hour shift {0} reaches further than a year")]
    HourShiftOutOfRange(i64),
    #[error("invalid id: {0}")]
    InvalidId(String),
}
