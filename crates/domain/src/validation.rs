//! Field validation shared by the customer, product, and order services.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use validator::ValidateEmail;

/// Maximum length of names and addresses, in characters.
pub const MAX_TEXT_LEN: usize = 255;

/// Maximum length of a contact number, in characters.
pub const MAX_CONTACT_NUMBER_LEN: usize = 17;

/// Maximum length of an email address.
pub const MAX_EMAIL_LEN: usize = 254;

/// Optional country prefix of up to four digits followed by ten digits.
static PHONE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?\d{1,4}?\d{10}$").expect("phone pattern is valid"));

/// Field-level validation messages, keyed by field path.
///
/// Serializes as a JSON object mapping each field to its list of messages.
/// Keys are sorted so responses are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message against a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the messages recorded for a field.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Moves every message of `other` under `prefix.field`.
    pub fn merge_nested(&mut self, prefix: &str, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0
                .entry(format!("{prefix}.{field}"))
                .or_default()
                .extend(messages);
        }
    }

    /// Returns `Ok(())` when nothing was recorded, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Trims `value` and checks it is non-empty and at most `max` characters.
///
/// Returns the trimmed text, or records a message and returns None.
pub fn required_text(
    errors: &mut FieldErrors,
    field: &str,
    value: &str,
    max: usize,
) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, "This field may not be blank.");
        return None;
    }
    if trimmed.chars().count() > max {
        errors.add(
            field,
            format!("Ensure this field has no more than {max} characters."),
        );
        return None;
    }
    Some(trimmed.to_string())
}

/// Validates a contact number. Blank is allowed and normalized to "".
pub fn contact_number(errors: &mut FieldErrors, field: &str, value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(String::new());
    }
    if trimmed.chars().count() > MAX_CONTACT_NUMBER_LEN {
        errors.add(
            field,
            format!("Ensure this field has no more than {MAX_CONTACT_NUMBER_LEN} characters."),
        );
        return None;
    }
    if !PHONE_NUMBER.is_match(trimmed) {
        errors.add(field, "Enter a valid phone number.");
        return None;
    }
    Some(trimmed.to_string())
}

/// Validates an email address.
pub fn email(errors: &mut FieldErrors, field: &str, value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, "This field may not be blank.");
        return None;
    }
    if trimmed.len() > MAX_EMAIL_LEN || !trimmed.validate_email() {
        errors.add(field, "Enter a valid email address.");
        return None;
    }
    Some(trimmed.to_string())
}
