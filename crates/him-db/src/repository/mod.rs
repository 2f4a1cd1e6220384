//! Repository layer: query functions organized by table.
//!
//! Every function takes the session's connection, so reads and writes made
//! while serving one request share a transaction.

pub mod auth_identities;
pub mod classes;
pub mod department_members;
pub mod departments;
pub mod member_classes;
pub mod members;
pub mod rooms;
pub mod users;
