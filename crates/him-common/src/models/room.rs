//! Room model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{HimError, HimResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    pub capacity: Option<i64>,
    pub location: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoomRequest {
    #[validate(length(min = 1, max = 255, message = "Room name must be 1-255 characters"))]
    pub name: String,

    #[validate(range(min = 1, message = "Capacity must be positive"))]
    pub capacity: Option<i64>,

    #[validate(length(max = 255))]
    pub location: Option<String>,

    #[validate(length(max = 5000))]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateRoomRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    #[validate(range(min = 1, message = "Capacity must be positive"))]
    pub capacity: Option<i64>,

    #[validate(length(max = 255))]
    pub location: Option<String>,

    #[validate(length(max = 5000))]
    pub description: Option<String>,
}

impl Room {
    /// Checked on every insert and update.
    pub fn check_invariants(&self) -> HimResult<()> {
        if matches!(self.capacity, Some(c) if c <= 0) {
            return Err(HimError::validation("Room capacity must be positive"));
        }
        Ok(())
    }

    pub fn apply(&mut self, update: UpdateRoomRequest) {
        if let Some(v) = update.name {
            self.name = v;
        }
        if let Some(v) = update.capacity {
            self.capacity = Some(v);
        }
        if let Some(v) = update.location {
            self.location = Some(v);
        }
        if let Some(v) = update.description {
            self.description = Some(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_must_be_positive() {
        let mut room = Room {
            id: Uuid::nil(),
            name: "Fellowship Hall".into(),
            capacity: Some(0),
            location: None,
            description: None,
        };
        assert!(room.check_invariants().is_err());
        room.capacity = None;
        assert!(room.check_invariants().is_ok());
        room.capacity = Some(120);
        assert!(room.check_invariants().is_ok());
    }
}
