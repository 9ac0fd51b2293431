pub mod google;
pub mod notifications;
pub mod storage;
