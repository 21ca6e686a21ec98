pub mod admissions;
pub mod auth;
pub mod content;
pub mod payments;
pub mod uploads;
