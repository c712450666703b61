//! # crew-core
//!
//! Core types shared across all Crew crates:
//! - Entity structs for projects, tasks, comments, and users
//! - Notification message envelope sent over live connections
//! - ID prefix constants
//! - Configurable input limits and their validation
//! - Cross-cutting error types

pub mod entities;
pub mod errors;
pub mod identity;
pub mod ids;
pub mod limits;
pub mod message;
