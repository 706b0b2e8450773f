//! Domain models for Campus.
//!
//! These are the core types shared across all crates.

pub mod activity;
pub mod assignment;
pub mod certificate;
pub mod group;
pub mod module;
pub mod progress;
pub mod progress_override;
pub mod tenant;
pub mod user;
