//! Department model: an organizational unit that may declare a JSON schema
//! for the extra data it keeps about its members.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,

    /// Set once at creation
    pub created_at: DateTime<Utc>,

    /// JSON schema for [`super::DepartmentMember::additional_fields`]
    pub custom_fields: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDepartmentRequest {
    #[validate(length(min = 1, max = 255, message = "Department name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    pub custom_fields: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateDepartmentRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    /// `null` removes the schema
    #[serde(default, deserialize_with = "super::nullable")]
    pub custom_fields: Option<Option<serde_json::Value>>,
}

impl Department {
    /// Merge a partial update. `created_at` never changes.
    pub fn apply(&mut self, update: UpdateDepartmentRequest) {
        if let Some(v) = update.name {
            self.name = v;
        }
        if let Some(v) = update.description {
            self.description = Some(v);
        }
        if let Some(v) = update.custom_fields {
            self.custom_fields = v;
        }
    }
}
