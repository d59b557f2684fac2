//! API models for request and response payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub mod task;

/// Distinguishes an omitted field from an explicit `null`
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// User entity as stored in the database
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User payload returned by the API; never carries the password hash
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// New user row ready for insertion; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
}

/// Request for user registration; missing fields surface as a 400 through
/// validation rather than a deserialization rejection
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request for profile update; omitted fields keep their current values,
/// an explicit `null` clears the name
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub name: Option<Option<String>>,
    pub email: Option<String>,
}

/// Response for register and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserResponse,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_response_never_contains_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "alice@test.com".to_string(),
            name: Some("Alice".to_string()),
            password_hash: "$argon2id$secret".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(UserResponse::from(&user)).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "alice@test.com");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_profile_update_distinguishes_omitted_name_from_null() {
        let omitted: UpdateProfileRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(omitted.name, None);

        let cleared: UpdateProfileRequest =
            serde_json::from_value(serde_json::json!({"name": null})).unwrap();
        assert_eq!(cleared.name, Some(None));

        let set: UpdateProfileRequest =
            serde_json::from_value(serde_json::json!({"name": "Alice"})).unwrap();
        assert_eq!(set.name, Some(Some("Alice".to_string())));
    }
}
