//! Event Registry - JSON-file-backed event registration service
//!
//! Users sign up, organize events with a fixed number of tickets, and join
//! events organized by others. Every collection lives in a single JSON file
//! that is rewritten atomically on each change.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         HTTP (axum)                           │
//! │   /health      /api/v1/auth/*        /api/v1/event/*          │
//! │                ┌──────────────────────────────────────┐       │
//! │                │        Admission Limiter              │       │
//! │                │  fixed window per client address      │       │
//! │                └──────────────────┬───────────────────┘       │
//! └───────────────────────────────────┼──────────────────────────┘
//!                                     │
//! ┌───────────────────────────────────▼──────────────────────────┐
//! │                          Registry                             │
//! │  - sign up / login / bearer tokens                            │
//! │  - event CRUD restricted to the organizer                     │
//! │  - registration: capacity check + back-references             │
//! └───────────────┬──────────────────────────────┬───────────────┘
//!                 │                              │
//!      ┌──────────▼──────────┐        ┌──────────▼──────────┐
//!      │  Collection<User>   │        │  Collection<Event>  │
//!      │  users.json         │        │  events.json        │
//!      └─────────────────────┘        └─────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`store`]: generic JSON document collections and ID generation
//! - [`users`]: user records and the auth API
//! - [`events`]: event records and the events API
//! - [`registry`]: operations spanning both collections
//! - [`ratelimit`]: per-client admission limiter and its middleware
//! - [`auth`]: password hashing and signed tokens
//! - [`notify`]: registration confirmation notices
//! - [`api`]: router assembly and error mapping
//! - [`config`]: configuration management

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod notify;
pub mod ratelimit;
pub mod registry;
pub mod store;
pub mod users;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use registry::Registry;
pub use store::Collection;
