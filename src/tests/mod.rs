mod balance_tests;
mod config_tests;

use crate::core::services::BillbusterService;
use crate::infrastructure::notifications::in_memory::InMemoryNotifier;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use std::sync::Arc;

pub fn create_test_service() -> BillbusterService {
    service_with(InMemoryStorage::new(), InMemoryNotifier::new())
}

/// Builds a service over backends the test keeps handles to, for seeding or inspecting them.
pub fn service_with(storage: InMemoryStorage, notifier: InMemoryNotifier) -> BillbusterService {
    BillbusterService::new(Arc::new(storage), Arc::new(notifier), 2)
}
