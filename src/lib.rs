pub mod analysis;
pub mod app;
pub mod auth;
pub mod config;
pub mod reminders;
pub mod state;
pub mod storage;
pub mod store;
pub mod uploads;
