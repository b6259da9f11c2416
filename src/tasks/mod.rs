//! Background Tasks Module
//!
//! Contains background tasks that run periodically during gateway operation.
//!
//! # Tasks
//! - Cleanup Sweep: Removes expired and corrupt entries and enforces the size limit

mod cleanup;

pub use cleanup::spawn_cleanup_task;
