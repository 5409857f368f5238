//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Bulletin refresh: keeps the county table warm between lookups

mod refresh;

pub use refresh::spawn_refresh_task;
