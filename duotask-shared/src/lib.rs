//! # DuoTask Shared Library
//!
//! Core of the DuoTask backend: the data model, the store contracts and
//! their backends, the auth primitives, the access policy and the service
//! operations the HTTP server exposes.
//!
//! ## Module Organization
//!
//! - `models`: Users, groups, tasks and their PostgreSQL queries
//! - `store`: Store traits plus PostgreSQL and in-memory backends
//! - `db`: Connection pool and embedded migrations
//! - `auth`: Password hashing, session tokens, invite codes, access policy
//! - `service`: Signup/login, the group-join protocol, task operations

pub mod auth;
pub mod db;
pub mod models;
pub mod service;
pub mod store;

/// Current version of the DuoTask shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
