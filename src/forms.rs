use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::session::Session;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_EMAIL: &str = "Invalid email address.";

/// Per-field validation messages, ordered by field name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        !self.get(field).is_empty()
    }

    pub fn extend(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Whitespace-only counts as missing. Returns the value as submitted.
pub(crate) fn required<'a>(
    errors: &mut FieldErrors,
    field: &'static str,
    value: &'a str,
) -> Option<&'a str> {
    if value.trim().is_empty() {
        errors.add(field, REQUIRED);
        None
    } else {
        Some(value)
    }
}

pub(crate) fn required_email(errors: &mut FieldErrors, field: &'static str, value: &str) -> String {
    let email = value.trim().to_lowercase();
    if required(errors, field, &email).is_some() && !is_valid_email(&email) {
        errors.add(field, INVALID_EMAIL);
    }
    email
}

/// Token to embed in the next rendered form, if the check is on.
pub(crate) fn csrf_field(enabled: bool, session: &mut Session) -> Option<String> {
    enabled.then(|| session.csrf_token())
}

/// Folds the CSRF check into a form's own validation result.
pub(crate) fn validate_with_csrf<T>(
    enabled: bool,
    session: &Session,
    submitted: &str,
    result: Result<T, FieldErrors>,
) -> Result<T, FieldErrors> {
    let mut errors = FieldErrors::new();
    if enabled {
        if let Err(message) = session.check_csrf(submitted) {
            errors.add("csrf_token", message);
        }
    }
    match result {
        Ok(value) if errors.is_empty() => Ok(value),
        Ok(_) => Err(errors),
        Err(form_errors) => {
            errors.extend(form_errors);
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("ada example@x.io"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn required_rejects_blank_and_keeps_value() {
        let mut errors = FieldErrors::new();
        assert_eq!(required(&mut errors, "password", "  "), None);
        assert_eq!(required(&mut errors, "username", " ada "), Some(" ada "));
        assert_eq!(errors.get("password"), [REQUIRED.to_string()]);
        assert!(!errors.has("username"));
    }

    #[test]
    fn required_email_normalizes_and_stops_after_missing() {
        let mut errors = FieldErrors::new();
        assert_eq!(required_email(&mut errors, "email", " Ada@Example.COM "), "ada@example.com");
        assert!(errors.is_empty());

        required_email(&mut errors, "email", "");
        assert_eq!(errors.get("email"), [REQUIRED.to_string()]);
    }

    #[test]
    fn extend_appends_per_field() {
        let mut a = FieldErrors::new();
        a.add("hours", "one");
        let mut b = FieldErrors::new();
        b.add("hours", "two");
        b.add("csrf_token", "three");
        a.extend(b);
        assert_eq!(a.get("hours"), ["one".to_string(), "two".to_string()]);
        assert!(a.has("csrf_token"));
    }

    #[test]
    fn into_result_only_builds_when_clean() {
        assert_eq!(FieldErrors::new().into_result(|| 7), Ok(7));
        let mut errors = FieldErrors::new();
        errors.add("hours", "bad");
        assert!(errors.clone().into_result(|| 7).is_err());
    }
}
