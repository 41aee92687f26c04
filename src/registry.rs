//! Registration service over the Users and Events collections
//!
//! Keeps the back-references between the two collections:
//! `User.createdEvents`, `User.participatedEvents` and `Event.participants`.
//! Each collection write is persisted on its own; there is no transaction
//! spanning both files, so a crash between the event write and the user write
//! leaves the user's list one entry short. Readers resolve the lists against
//! the Events collection and skip IDs that no longer exist.

use crate::auth::{PasswordHasher, TokenIssuer};
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::events::{Event, EventPatch, NewEvent};
use crate::notify::{Notification, Notifier};
use crate::store::Collection;
use crate::users::{NewUser, User};
use std::sync::Arc;

/// Users, events and the operations that touch both
pub struct Registry {
    users: Collection<User>,
    events: Collection<Event>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
    notifier: Arc<dyn Notifier>,
}

impl Registry {
    pub fn new(
        users: Collection<User>,
        events: Collection<Event>,
        hasher: PasswordHasher,
        tokens: TokenIssuer,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            users,
            events,
            hasher,
            tokens,
            notifier,
        }
    }

    /// Open both collections under the configured data directory
    pub async fn open(config: &AppConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let users = Collection::open(config.storage.users_path()).await?;
        let events = Collection::open(config.storage.events_path()).await?;
        let hasher = PasswordHasher::new(config.auth.pbkdf2_iterations)?;
        let tokens = TokenIssuer::from_config(&config.auth);

        tracing::info!(
            users = %users.path().display(),
            events = %events.path().display(),
            "Opened collections"
        );
        Ok(Self::new(users, events, hasher, tokens, notifier))
    }

    pub fn users(&self) -> &Collection<User> {
        &self.users
    }

    pub fn events(&self) -> &Collection<Event> {
        &self.events
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Create a user; the email must not belong to an existing user
    pub async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<User> {
        let fields = NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password: self.hasher.hash(password),
        };
        let user = self
            .users
            .create_unless(|u| u.email == email, fields)
            .await?
            .ok_or_else(|| Error::Conflict("user already exists".to_string()))?;

        tracing::info!(user_id = %user.id(), "User registered");
        Ok(user)
    }

    /// Verify credentials and issue a bearer token
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let user = self
            .find_user_by_email(email)
            .await?
            .ok_or(Error::InvalidCredentials)?;
        if !self.hasher.verify(password, &user.password) {
            return Err(Error::InvalidCredentials);
        }

        self.tokens.issue(user.id(), &user.email)
    }

    /// Resolve a bearer token to an existing user
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let claims = self.tokens.verify(token)?;
        self.users
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| Error::Unauthorized("user not found".to_string()))
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.users.find(|u| u.email == email).await
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Create an event and record it on the organizer
    pub async fn create_event(&self, new_event: NewEvent) -> Result<Event> {
        let event = self.events.create(new_event).await?;
        self.add_created_event(&event.created_by, event.id()).await?;

        tracing::info!(
            event_id = %event.id(),
            organizer = %event.created_by,
            tickets = event.number_of_tickets,
            "Event created"
        );
        Ok(event)
    }

    pub async fn list_events(&self) -> Result<Vec<Event>> {
        self.events.all().await
    }

    pub async fn get_event(&self, event_id: &str) -> Result<Event> {
        self.events
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| Error::NotFound("Event".to_string()))
    }

    /// Patch an event; only its organizer may do so
    pub async fn update_event(&self, actor_id: &str, event_id: &str, patch: EventPatch) -> Result<Event> {
        self.ensure_organizer(actor_id, event_id).await?;
        self.events
            .update(event_id, patch)
            .await?
            .ok_or_else(|| Error::NotFound("Event".to_string()))
    }

    /// Delete an event; only its organizer may do so
    pub async fn delete_event(&self, actor_id: &str, event_id: &str) -> Result<()> {
        self.ensure_organizer(actor_id, event_id).await?;
        if !self.events.delete(event_id).await? {
            return Err(Error::NotFound("Event".to_string()));
        }

        tracing::info!(event_id = %event_id, "Event deleted");
        Ok(())
    }

    /// Register `user_id` for `event_id`.
    ///
    /// The capacity check, seat decrement and participant append happen in
    /// one Events write; the user's `participatedEvents` is updated after.
    /// The confirmation notification is sent in the background.
    pub async fn register_for_event(&self, user_id: &str, event_id: &str) -> Result<Event> {
        let event = self
            .events
            .update_with(event_id, |event| {
                if event.remaining_tickets == 0 {
                    return Err(Error::NoCapacity);
                }
                if event.has_participant(user_id) {
                    return Err(Error::AlreadyRegistered);
                }
                event.participants.push(user_id.to_string());
                event.remaining_tickets -= 1;
                Ok(())
            })
            .await?
            .ok_or_else(|| Error::NotFound("Event".to_string()))?;

        self.add_participated_event(user_id, event.id()).await?;

        tracing::info!(
            event_id = %event.id(),
            user_id = %user_id,
            remaining = event.remaining_tickets,
            "User joined event"
        );

        if let Some(user) = self.users.find_by_id(user_id).await? {
            let notification = Notification::registration_confirmed(&user, &event);
            let notifier = self.notifier.clone();
            tokio::spawn(async move {
                notifier.send(notification).await;
            });
        }

        Ok(event)
    }

    /// Events listed in the user's `createdEvents`
    pub async fn events_created_by(&self, user_id: &str) -> Result<Vec<Event>> {
        let user = self.require_user(user_id).await?;
        self.events
            .filter(|e| user.created_events.iter().any(|id| id == e.id()))
            .await
    }

    /// Events listed in the user's `participatedEvents`
    pub async fn events_joined_by(&self, user_id: &str) -> Result<Vec<Event>> {
        let user = self.require_user(user_id).await?;
        self.events
            .filter(|e| user.participated_events.iter().any(|id| id == e.id()))
            .await
    }

    /// Events whose `createdBy` is `user_id`
    pub async fn events_by_organizer(&self, user_id: &str) -> Result<Vec<Event>> {
        self.events.filter(|e| e.created_by == user_id).await
    }

    /// Events whose `participants` include `user_id`
    pub async fn events_for_participant(&self, user_id: &str) -> Result<Vec<Event>> {
        self.events.filter(|e| e.has_participant(user_id)).await
    }

    // =========================================================================
    // Back-references
    // =========================================================================

    async fn add_created_event(&self, user_id: &str, event_id: &str) -> Result<()> {
        let updated = self
            .users
            .update_with(user_id, |user| {
                user.created_events.push(event_id.to_string());
                Ok(())
            })
            .await?;
        if updated.is_none() {
            tracing::warn!(user_id = %user_id, event_id = %event_id, "Organizer not found");
        }
        Ok(())
    }

    async fn add_participated_event(&self, user_id: &str, event_id: &str) -> Result<()> {
        let updated = self
            .users
            .update_with(user_id, |user| {
                if !user.participated_events.iter().any(|id| id == event_id) {
                    user.participated_events.push(event_id.to_string());
                }
                Ok(())
            })
            .await?;
        if updated.is_none() {
            tracing::warn!(user_id = %user_id, event_id = %event_id, "Participant not found");
        }
        Ok(())
    }

    async fn require_user(&self, user_id: &str) -> Result<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| Error::NotFound("User".to_string()))
    }

    async fn ensure_organizer(&self, actor_id: &str, event_id: &str) -> Result<()> {
        let event = self.get_event(event_id).await?;
        if event.created_by != actor_id {
            return Err(Error::Forbidden(
                "You do not have access to this resource".to_string(),
            ));
        }
        Ok(())
    }
}
