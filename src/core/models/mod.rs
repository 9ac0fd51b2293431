pub mod group;
pub mod notification;
pub mod reminder;
pub mod transaction;
