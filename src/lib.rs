//! Alarmwatch library
//!
//! Polls the civil-defense alert feed and fans out localized notifications.
//! Exposes modules for integration testing and binary reuse.

pub mod domain;
pub mod infra;
pub mod io;
pub mod services;
