//! Events module: event management and registration
//!
//! Provides REST endpoints for creating, listing, updating, deleting, and
//! joining events. Events are persisted in the `Events` collection file.

pub mod handler;
pub mod types;

pub use handler::events_router;
pub use types::{CreateEventRequest, Event, EventPatch, NewEvent};
