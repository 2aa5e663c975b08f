//! arc2zen: migrates an Arc sidebar into a Zen browser profile.
//!
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod app;
pub mod database;
pub mod managers;
pub mod services;
pub mod types;
