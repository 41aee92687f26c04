//! Users module: accounts and authentication
//!
//! Provides REST endpoints for signing up, logging in, and listing the
//! caller's own created and joined events. Users are persisted in the
//! `users` collection file.

pub mod handler;
pub mod types;

pub use handler::auth_router;
pub use types::{LoginRequest, NewUser, SignUpRequest, User, UserPatch, UserView};
