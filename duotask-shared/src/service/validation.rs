/// Explicit input validation
///
/// Input structs derive [`validator::Validate`] for the declarative rules
/// (email format, length bounds). Rules the derive cannot express, such as
/// "not blank after trimming", are checked by hand and merged in. Either way
/// the caller gets one structured outcome: `Ok(())` or
/// [`ServiceError::ValidationFailed`] with violations sorted by field.

use validator::{Validate, ValidationErrors};

use super::error::{FieldViolation, ServiceError, ServiceResult};

/// Flattens validator output into field violations
pub fn field_violations(errors: &ValidationErrors) -> Vec<FieldViolation> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldViolation {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Validation failed".to_string()),
            })
        })
        .collect()
}

/// `Some(violation)` if `value` is empty after trimming
pub fn check_not_blank(field: &str, value: &str, message: &str) -> Option<FieldViolation> {
    if value.trim().is_empty() {
        Some(FieldViolation::new(field, message))
    } else {
        None
    }
}

/// Runs the derived rules plus any hand-written `extra` checks
pub fn validate_with<T, I>(input: &T, extra: I) -> ServiceResult<()>
where
    T: Validate,
    I: IntoIterator<Item = Option<FieldViolation>>,
{
    let mut violations = match input.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => field_violations(&errors),
    };
    violations.extend(extra.into_iter().flatten());

    if violations.is_empty() {
        return Ok(());
    }

    violations.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.message.cmp(&b.message)));
    violations.dedup();
    Err(ServiceError::ValidationFailed(violations))
}

/// Runs the derived rules only
pub fn validate_input<T: Validate>(input: &T) -> ServiceResult<()> {
    validate_with(input, std::iter::empty())
}
