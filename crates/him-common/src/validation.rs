//! Request-body validation shared by every route.

use validator::Validate;

use crate::error::HimError;

/// Validate a request body, returning a HimError::Validation on failure.
pub fn validate_request<T: Validate>(body: &T) -> Result<(), HimError> {
    body.validate().map_err(|e| HimError::Validation {
        message: format_validation_errors(&e),
    })
}

/// One `field: message` entry per failed rule, sorted by field name so the
/// output is stable.
fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => format!("{field}: {msg}"),
                None => format!("{field}: invalid value ({})", e.code),
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateRoomRequest;

    #[test]
    fn test_errors_name_the_field() {
        let body = CreateRoomRequest {
            name: String::new(),
            capacity: Some(-1),
            location: None,
            description: None,
        };
        let HimError::Validation { message } = validate_request(&body).unwrap_err() else {
            panic!("expected validation error");
        };
        assert!(message.starts_with("capacity: Capacity must be positive"));
        assert!(message.contains("name: Room name must be 1-255 characters"));
    }

    #[test]
    fn test_valid_body_passes() {
        let body = CreateRoomRequest {
            name: "Chapel".into(),
            capacity: Some(80),
            location: Some("East wing".into()),
            description: None,
        };
        assert!(validate_request(&body).is_ok());
    }
}
