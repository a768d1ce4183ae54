pub mod error;
pub mod reconciler;
pub mod sync_service;

#[cfg(test)]
mod testing;
