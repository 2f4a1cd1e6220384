//! User model: a login-capable account, separate from the people the
//! church tracks as members.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,

    /// Unique across users (enforced by the storage layer)
    pub email: String,

    pub full_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 255))]
    pub email: String,

    #[validate(length(min = 1, max = 100, message = "Full name must be 1-100 characters"))]
    pub full_name: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 255))]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub full_name: Option<String>,
}

impl User {
    pub fn apply(&mut self, update: UpdateUserRequest) {
        if let Some(v) = update.email {
            self.email = v;
        }
        if let Some(v) = update.full_name {
            self.full_name = v;
        }
    }
}
