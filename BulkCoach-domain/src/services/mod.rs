pub mod body_fat;
pub mod body_log;
pub mod coach;
pub mod diet;
pub mod suggestion;
pub mod trend;

// Domain services
// Trend analysis and the suggestion engine are pure; the services wrap them with storage.

use validator::ValidationErrors;

// Re-export service traits and factory functions
pub use body_log::{create_default_body_log_service, BodyLogServiceError, BodyLogServiceTrait};
pub use coach::{create_coach_service, create_default_coach_service, CoachServiceError, CoachServiceTrait};
pub use diet::{create_default_diet_service, DietServiceError, DietServiceTrait};

/// Flatten validator errors into "field: message; field: message"
pub(crate) fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let error_msgs: Vec<String> = errors
                .iter()
                .map(|err| match &err.message {
                    Some(msg) => msg.to_string(),
                    None => format!("Invalid {}", field),
                })
                .collect();
            format!("{}: {}", field, error_msgs.join(", "))
        })
        .collect();

    // Nested structs and lists report under their own field
    for (field, kind) in errors.errors() {
        if !matches!(kind, validator::ValidationErrorsKind::Field(_)) {
            messages.push(format!("{}: invalid entries", field));
        }
    }

    messages.sort();
    messages.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::body_log::CreateBodyLogRequest;
    use crate::testing::fixtures::{as_of, log_request};
    use validator::Validate;

    #[test]
    fn test_validation_message_names_fields() {
        let request = CreateBodyLogRequest {
            bio_body_fat_percent: Some(95.0),
            ..log_request("", as_of(), 5.0)
        };
        let message = validation_message(&request.validate().unwrap_err());

        assert!(message.contains("user_id: user_id must be between 1 and 128 characters"));
        assert!(message.contains("weight_kg: Weight must be between 20 and 400 kg"));
        assert!(message.contains("bio_body_fat_percent"));
    }

    #[test]
    fn test_validation_message_reports_nested_structs() {
        let mut request = log_request("user-1", as_of(), 80.0);
        request.skinfolds.chest = Some(150.0);
        let message = validation_message(&request.validate().unwrap_err());
        assert!(message.contains("skinfolds"));
    }
}
