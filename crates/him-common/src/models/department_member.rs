//! A member's membership in a department, with department-specific data.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentMember {
    pub id: Uuid,
    pub member_id: Uuid,
    pub department_id: Uuid,

    /// Must satisfy the department's `custom_fields` schema when both are set
    pub additional_fields: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddDepartmentMemberRequest {
    pub member_id: Uuid,
    pub additional_fields: Option<serde_json::Value>,
}

/// Replaces the stored additional fields when present; `null` clears them
/// and an absent key leaves them alone.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDepartmentMemberRequest {
    #[serde(default, deserialize_with = "super::nullable")]
    pub additional_fields: Option<Option<serde_json::Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_and_null_fields_differ() {
        let absent: UpdateDepartmentMemberRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(absent.additional_fields, None);

        let cleared: UpdateDepartmentMemberRequest =
            serde_json::from_value(json!({ "additional_fields": null })).unwrap();
        assert_eq!(cleared.additional_fields, Some(None));

        let set: UpdateDepartmentMemberRequest =
            serde_json::from_value(json!({ "additional_fields": { "grade": 9 } })).unwrap();
        assert_eq!(set.additional_fields, Some(Some(json!({ "grade": 9 }))));
    }
}
