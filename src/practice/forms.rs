use serde::Deserialize;

use crate::forms::{required, FieldErrors};

pub const NOT_AN_INTEGER: &str = "Not a valid integer value.";
pub const BELOW_MINIMUM: &str = "Number must be at least 0.";

/// Raw `/dashboard` submission. `hours` stays text so a bad number is a
/// field error rather than a rejected request.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct PracticeForm {
    pub hours: String,
    pub csrf_token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidPractice {
    pub hours: i64,
}

impl PracticeForm {
    pub fn validate(&self) -> Result<ValidPractice, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut hours = 0;
        if let Some(raw) = required(&mut errors, "hours", &self.hours) {
            match raw.trim().parse::<i64>() {
                Ok(h) if h < 0 => errors.add("hours", BELOW_MINIMUM),
                Ok(h) => hours = h,
                Err(_) => errors.add("hours", NOT_AN_INTEGER),
            }
        }
        errors.into_result(|| ValidPractice { hours })
    }
}
