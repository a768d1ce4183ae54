pub mod error;
pub mod events;
pub mod ids;
pub mod membership;
pub mod rotation;
pub mod support;
pub mod username;
