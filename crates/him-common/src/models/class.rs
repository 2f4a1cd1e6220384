//! Class model: a scheduled activity run by a department.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{HimError, HimResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Class {
    pub id: Uuid,
    pub department_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub room_id: Option<Uuid>,

    /// Teaching member
    pub teacher_id: Option<Uuid>,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    /// Whole currency units, never negative
    pub cost: i64,

    /// Upper bound on enrollments, if any
    pub max_capacity: Option<i64>,
}

impl Class {
    /// Checked on every insert and update, after partial updates are merged.
    pub fn check_invariants(&self) -> HimResult<()> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(HimError::validation(format!(
                    "end_date {end} precedes start_date {start}"
                )));
            }
        }
        if self.cost < 0 {
            return Err(HimError::validation("Cost cannot be negative"));
        }
        if matches!(self.max_capacity, Some(c) if c <= 0) {
            return Err(HimError::validation("max_capacity must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClassRequest {
    pub department_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Class name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    pub room_id: Option<Uuid>,
    pub teacher_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    #[validate(range(min = 0, message = "Cost cannot be negative"))]
    pub cost: Option<i64>,

    #[validate(range(min = 1, message = "max_capacity must be positive"))]
    pub max_capacity: Option<i64>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateClassRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    /// `null` detaches the room, teacher or date
    #[serde(default, deserialize_with = "super::nullable")]
    pub room_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub teacher_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub end_date: Option<Option<NaiveDate>>,

    #[validate(range(min = 0, message = "Cost cannot be negative"))]
    pub cost: Option<i64>,

    #[validate(range(min = 1, message = "max_capacity must be positive"))]
    pub max_capacity: Option<i64>,
}

impl Class {
    pub fn apply(&mut self, update: UpdateClassRequest) {
        if let Some(v) = update.name {
            self.name = v;
        }
        if let Some(v) = update.description {
            self.description = Some(v);
        }
        if let Some(v) = update.room_id {
            self.room_id = v;
        }
        if let Some(v) = update.teacher_id {
            self.teacher_id = v;
        }
        if let Some(v) = update.start_date {
            self.start_date = v;
        }
        if let Some(v) = update.end_date {
            self.end_date = v;
        }
        if let Some(v) = update.cost {
            self.cost = v;
        }
        if let Some(v) = update.max_capacity {
            self.max_capacity = Some(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class() -> Class {
        Class {
            id: Uuid::nil(),
            department_id: Uuid::nil(),
            name: "Bible Study".into(),
            description: None,
            room_id: None,
            teacher_id: None,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 5),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 30),
            cost: 0,
            max_capacity: Some(20),
        }
    }

    #[test]
    fn test_valid_class_passes() {
        assert!(class().check_invariants().is_ok());
    }

    #[test]
    fn test_end_before_start_rejected() {
        let mut c = class();
        c.end_date = NaiveDate::from_ymd_opt(2024, 12, 31);
        assert!(matches!(c.check_invariants(), Err(HimError::Validation { .. })));
    }

    #[test]
    fn test_same_day_class_allowed() {
        let mut c = class();
        c.end_date = c.start_date;
        assert!(c.check_invariants().is_ok());
    }

    #[test]
    fn test_negative_cost_rejected() {
        let mut c = class();
        c.cost = -5;
        assert!(c.check_invariants().is_err());
    }

    #[test]
    fn test_merged_update_is_rechecked() {
        let mut c = class();
        c.apply(UpdateClassRequest {
            start_date: Some(NaiveDate::from_ymd_opt(2025, 6, 1)),
            ..Default::default()
        });
        assert!(c.check_invariants().is_err());
    }

    #[test]
    fn test_null_clears_room_absent_keeps_teacher() {
        let mut c = class();
        c.room_id = Some(Uuid::nil());
        c.teacher_id = Some(Uuid::nil());

        let update: UpdateClassRequest =
            serde_json::from_value(serde_json::json!({ "room_id": null })).unwrap();
        c.apply(update);
        assert_eq!(c.room_id, None);
        assert_eq!(c.teacher_id, Some(Uuid::nil()));
    }

    #[test]
    fn test_request_rejects_zero_capacity() {
        let body: CreateClassRequest = serde_json::from_value(serde_json::json!({
            "department_id": Uuid::nil(),
            "name": "Choir",
            "max_capacity": 0
        }))
        .unwrap();
        assert!(body.validate().is_err());
    }
}
