pub mod announcements;
pub mod attendance;
pub mod core;
pub mod library;
pub mod requests;
pub mod schedules;
pub mod session;
