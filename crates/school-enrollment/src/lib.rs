//! School enrollment service: admissions intake, review, class placement, and
//! the site content that surrounds them.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
