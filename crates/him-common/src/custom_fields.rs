//! Department custom fields.
//!
//! A department may store a JSON schema in `custom_fields`; every membership
//! in that department must then carry `additional_fields` that satisfy it.
//! Both checks run inside the repository write paths, so no caller can skip
//! them.

use serde_json::Value;

use crate::error::{HimError, HimResult};

/// Null, `{}` and `[]` count as "not set" on either side.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Reject a department schema that does not compile as a JSON schema.
pub fn check_schema(schema: Option<&Value>) -> HimResult<()> {
    let Some(schema) = schema.filter(|s| !is_blank(s)) else {
        return Ok(());
    };
    jsonschema::validator_for(schema)
        .map(|_| ())
        .map_err(|e| HimError::validation(format!("custom_fields is not a valid JSON schema: {e}")))
}

/// Validate a membership's `additional_fields` against its department's schema.
///
/// Passes when either side is unset. On mismatch the error carries the JSON
/// pointer of the first offending value (`/` for the document root).
pub fn validate_additional_fields(
    schema: Option<&Value>,
    fields: Option<&Value>,
) -> HimResult<()> {
    let (Some(schema), Some(fields)) = (schema, fields) else {
        return Ok(());
    };
    if is_blank(schema) || is_blank(fields) {
        return Ok(());
    }

    let validator = jsonschema::validator_for(schema)
        .map_err(|e| HimError::validation(format!("custom_fields is not a valid JSON schema: {e}")))?;

    match validator.iter_errors(fields).next() {
        None => Ok(()),
        Some(err) => {
            let pointer = err.instance_path.to_string();
            Err(HimError::SchemaViolation {
                path: if pointer.is_empty() { "/".into() } else { pointer },
                message: err.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn youth_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "grade": { "type": "integer", "minimum": 1, "maximum": 12 },
                "guardian": {
                    "type": "object",
                    "properties": { "phone": { "type": "string" } },
                    "required": ["phone"]
                },
                "allergies": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["grade"]
        })
    }

    fn violation_path(result: HimResult<()>) -> String {
        match result {
            Err(HimError::SchemaViolation { path, .. }) => path,
            other => panic!("expected schema violation, got {other:?}"),
        }
    }

    #[test]
    fn test_conforming_fields_accepted() {
        let fields = json!({ "grade": 7, "guardian": { "phone": "555-0101" }, "allergies": ["nuts"] });
        assert!(validate_additional_fields(Some(&youth_schema()), Some(&fields)).is_ok());
    }

    #[test]
    fn test_wrong_type_reports_field_path() {
        let fields = json!({ "grade": "seventh" });
        assert_eq!(
            violation_path(validate_additional_fields(Some(&youth_schema()), Some(&fields))),
            "/grade"
        );
    }

    #[test]
    fn test_nested_violation_reports_nested_path() {
        let fields = json!({ "grade": 3, "allergies": ["dust", 4] });
        assert_eq!(
            violation_path(validate_additional_fields(Some(&youth_schema()), Some(&fields))),
            "/allergies/1"
        );
    }

    #[test]
    fn test_missing_required_reports_parent_path() {
        let fields = json!({ "grade": 3, "guardian": {} });
        assert_eq!(
            violation_path(validate_additional_fields(Some(&youth_schema()), Some(&fields))),
            "/guardian"
        );

        let fields = json!({ "allergies": [] });
        assert_eq!(
            violation_path(validate_additional_fields(Some(&youth_schema()), Some(&fields))),
            "/"
        );
    }

    #[test]
    fn test_unset_sides_skip_validation() {
        let fields = json!({ "grade": "n/a" });
        assert!(validate_additional_fields(None, Some(&fields)).is_ok());
        assert!(validate_additional_fields(Some(&json!({})), Some(&fields)).is_ok());
        assert!(validate_additional_fields(Some(&youth_schema()), None).is_ok());
        assert!(validate_additional_fields(Some(&youth_schema()), Some(&json!({}))).is_ok());
        assert!(validate_additional_fields(Some(&youth_schema()), Some(&Value::Null)).is_ok());
    }

    #[test]
    fn test_schema_must_compile() {
        assert!(check_schema(Some(&youth_schema())).is_ok());
        assert!(check_schema(None).is_ok());
        let broken = json!({ "type": "integer", "minimum": "zero" });
        assert!(matches!(
            check_schema(Some(&broken)),
            Err(HimError::Validation { .. })
        ));
    }
}
