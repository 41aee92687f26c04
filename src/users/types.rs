//! User records and auth wire types

use crate::store::{Document, RecordMeta};
use serde::{Deserialize, Serialize};

/// A registered user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    pub email: String,
    /// Password hash; never returned over the API
    pub password: String,
    #[serde(default)]
    pub created_events: Vec<String>,
    #[serde(default)]
    pub participated_events: Vec<String>,
}

impl User {
    pub fn id(&self) -> &str {
        &self.meta.id
    }
}

/// Fields supplied when creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Partial update of a user
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub created_events: Option<Vec<String>>,
    pub participated_events: Option<Vec<String>>,
}

impl Document for User {
    const COLLECTION: &'static str = "users";
    type Fields = NewUser;
    type Patch = UserPatch;

    fn build(meta: RecordMeta, fields: NewUser) -> Self {
        Self {
            meta,
            name: fields.name,
            email: fields.email,
            password: fields.password,
            created_events: Vec::new(),
            participated_events: Vec::new(),
        }
    }

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn apply(&mut self, patch: UserPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(password) = patch.password {
            self.password = password;
        }
        if let Some(created_events) = patch.created_events {
            self.created_events = created_events;
        }
        if let Some(participated_events) = patch.participated_events {
            self.participated_events = participated_events;
        }
    }
}

/// A user as returned over the API (no password hash)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    pub email: String,
    pub created_events: Vec<String>,
    pub participated_events: Vec<String>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            meta: user.meta,
            name: user.name,
            email: user.email,
            created_events: user.created_events,
            participated_events: user.participated_events,
        }
    }
}

/// Request body for signing up
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for logging in
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_user() -> User {
        let now = Utc::now();
        User::build(
            RecordMeta {
                id: "user-1".to_string(),
                created_at: now,
                updated_at: now,
            },
            NewUser {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                password: "hash".to_string(),
            },
        )
    }

    #[test]
    fn test_user_serialization() {
        let user = sample_user();
        let json = serde_json::to_value(&user).unwrap();

        assert_eq!(json["id"], "user-1");
        assert_eq!(json["email"], "ada@example.com");
        assert!(json["createdAt"].is_string());
        assert_eq!(json["createdEvents"], serde_json::json!([]));
        assert_eq!(json["participatedEvents"], serde_json::json!([]));

        let parsed: User = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, user);
    }

    #[test]
    fn test_user_without_relationship_lists() {
        let json = r#"{
            "id": "u",
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-01T10:00:00Z",
            "name": "Old",
            "email": "old@example.com",
            "password": "hash"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert!(user.created_events.is_empty());
        assert!(user.participated_events.is_empty());
    }

    #[test]
    fn test_view_hides_password() {
        let view = UserView::from(sample_user());
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["name"], "Ada");
        assert_eq!(json["id"], "user-1");
    }

    #[test]
    fn test_apply_patch() {
        let mut user = sample_user();
        user.apply(UserPatch {
            name: Some("Grace".to_string()),
            ..Default::default()
        });
        assert_eq!(user.name, "Grace");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.password, "hash");
    }

    #[test]
    fn test_sign_up_request_missing_fields() {
        let req: SignUpRequest = serde_json::from_str(r#"{"email": "x@y.z"}"#).unwrap();
        assert!(req.name.is_empty());
        assert!(req.password.is_empty());
    }
}
