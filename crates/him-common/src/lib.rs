//! # him-common
//!
//! Shared settings, error handling, entity models and validation used across
//! all Project HIM crates. No I/O lives here beyond reading the environment.

pub mod any_row;
pub mod config;
pub mod custom_fields;
pub mod error;
pub mod ids;
pub mod models;
pub mod validation;
