pub mod chat;
pub mod http;
pub mod notify;
pub mod oncall;
