pub mod api;
pub mod config;
pub mod core;
pub mod infrastructure;

pub use crate::api::build_router;
pub use crate::config::Config;
pub use crate::core::errors::BillbusterError;
pub use crate::core::services::BillbusterService;
pub use crate::infrastructure::notifications::in_memory::InMemoryNotifier;
pub use crate::infrastructure::storage::in_memory::InMemoryStorage;

#[cfg(test)]
mod tests;
