//! API route modules.

pub mod auth;
pub mod classes;
pub mod departments;
pub mod health;
pub mod members;
pub mod rooms;
pub mod users;
