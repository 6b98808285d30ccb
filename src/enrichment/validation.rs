use std::borrow::Cow;
use std::fmt;
use validator::{Validate, ValidationError};

/// A data contract that can be checked with [`validate_schema`]
pub trait Schema: Validate {
    /// Name used in violation messages
    const NAME: &'static str;
}

/// A single rule broken by a single field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub code: String,
    pub message: String,
}

/// All field violations found in one schema instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolations {
    pub schema: &'static str,
    pub violations: Vec<FieldViolation>,
}

impl SchemaViolations {
    /// Whether `field` broke at least one rule
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    pub fn fields(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.field.as_str()).collect()
    }
}

impl fmt::Display for SchemaViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed for {}: ", self.schema)?;
        let parts: Vec<String> = self
            .violations
            .iter()
            .map(|v| format!("{} {}", v.field, v.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for SchemaViolations {}

/// Apply the field rules declared on `T` and collect every violation
pub fn validate_schema<T: Schema>(value: &T) -> Result<(), SchemaViolations> {
    let errors = match value.validate() {
        Ok(()) => return Ok(()),
        Err(errors) => errors,
    };

    let mut violations: Vec<FieldViolation> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, field_errors)| {
            let field = field.to_string();
            field_errors.iter().map(move |error| FieldViolation {
                field: field.clone(),
                code: error.code.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("failed rule '{}'", error.code)),
            })
        })
        .collect();

    // field_errors() is backed by a HashMap
    violations.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.code.cmp(&b.code)));

    Err(SchemaViolations {
        schema: T::NAME,
        violations,
    })
}

/// Field rule: value must contain at least one non-whitespace character
pub fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_blank");
        error.message = Some(Cow::Borrowed("must not be blank"));
        return Err(error);
    }
    Ok(())
}
