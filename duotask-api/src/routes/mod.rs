/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Signup and login
/// - `relationships`: Profile, group creation, invite codes, joining
/// - `tasks`: Task CRUD

pub mod auth;
pub mod health;
pub mod relationships;
pub mod tasks;
