//! Event records and wire types
//!
//! All types use camelCase JSON serialization.

use crate::store::{Document, RecordMeta};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An event users can register for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub price: f64,
    /// Capacity at creation, never changed afterwards
    pub number_of_tickets: u32,
    pub remaining_tickets: u32,
    /// Organizer user ID, never changed afterwards
    pub created_by: String,
    pub date_of_conduct: DateTime<Utc>,
    #[serde(default)]
    pub participants: Vec<String>,
}

impl Event {
    pub fn id(&self) -> &str {
        &self.meta.id
    }

    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p == user_id)
    }
}

/// Fields supplied when creating an event
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub location: String,
    pub price: f64,
    pub number_of_tickets: u32,
    pub created_by: String,
    pub date_of_conduct: DateTime<Utc>,
}

/// Partial update of an event.
///
/// Capacity, organizer and the participant list are not patchable; seats
/// change only through registration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub price: Option<f64>,
    #[serde(alias = "date")]
    pub date_of_conduct: Option<DateTime<Utc>>,
}

impl Document for Event {
    const COLLECTION: &'static str = "Events";
    type Fields = NewEvent;
    type Patch = EventPatch;

    fn build(meta: RecordMeta, fields: NewEvent) -> Self {
        Self {
            meta,
            title: fields.title,
            description: fields.description,
            location: fields.location,
            price: fields.price,
            number_of_tickets: fields.number_of_tickets,
            remaining_tickets: fields.number_of_tickets,
            created_by: fields.created_by,
            date_of_conduct: fields.date_of_conduct,
            participants: Vec::new(),
        }
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn apply(&mut self, patch: EventPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(date_of_conduct) = patch.date_of_conduct {
            self.date_of_conduct = date_of_conduct;
        }
    }
}

/// Request body for creating an event
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub price: f64,
    pub number_of_tickets: u32,
    #[serde(alias = "dateOfConduct")]
    pub date: DateTime<Utc>,
}

impl CreateEventRequest {
    pub fn into_new_event(self, organizer_id: &str) -> NewEvent {
        NewEvent {
            title: self.title,
            description: self.description,
            location: self.location,
            price: self.price,
            number_of_tickets: self.number_of_tickets,
            created_by: organizer_id.to_string(),
            date_of_conduct: self.date,
        }
    }
}
