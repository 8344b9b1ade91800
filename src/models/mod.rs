pub mod application;
pub mod candidate;
pub mod job;
pub mod note;
pub mod notification_log;
