use serde::Deserialize;

use crate::forms::{required, required_email, FieldErrors};

pub const PASSWORDS_DIFFER: &str = "Field must be equal to password.";

/// Raw `/register` submission. Missing fields arrive as empty strings.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub csrf_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRegistration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<ValidRegistration, FieldErrors> {
        let mut errors = FieldErrors::new();

        let username = required(&mut errors, "username", &self.username)
            .map(|u| u.trim().to_string())
            .unwrap_or_default();
        let email = required_email(&mut errors, "email", &self.email);
        let password = required(&mut errors, "password", &self.password);
        if required(&mut errors, "confirm_password", &self.confirm_password).is_some()
            && self.confirm_password != self.password
        {
            errors.add("confirm_password", PASSWORDS_DIFFER);
        }

        let password = password.unwrap_or_default().to_string();
        errors.into_result(|| ValidRegistration {
            username,
            email,
            password,
        })
    }
}

/// Raw `/login` submission.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub csrf_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidLogin {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<ValidLogin, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = required_email(&mut errors, "email", &self.email);
        let password = required(&mut errors, "password", &self.password)
            .unwrap_or_default()
            .to_string();
        errors.into_result(|| ValidLogin { email, password })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::{INVALID_EMAIL, REQUIRED};

    fn registration(username: &str, email: &str, pw: &str, confirm: &str) -> RegistrationForm {
        RegistrationForm {
            username: username.into(),
            email: email.into(),
            password: pw.into(),
            confirm_password: confirm.into(),
            csrf_token: String::new(),
        }
    }

    #[test]
    fn valid_registration_is_normalized() {
        let ok = registration(" ada ", " Ada@Example.com", " pw ", " pw ")
            .validate()
            .expect("valid");
        assert_eq!(ok.username, "ada");
        assert_eq!(ok.email, "ada@example.com");
        assert_eq!(ok.password, " pw ");
    }

    #[test]
    fn empty_registration_flags_every_field() {
        let errors = RegistrationForm::default().validate().unwrap_err();
        for field in ["username", "email", "password", "confirm_password"] {
            assert_eq!(errors.get(field), [REQUIRED.to_string()], "{field}");
        }
    }

    #[test]
    fn mismatched_confirmation_and_bad_email() {
        let errors = registration("ada", "not-an-email", "one", "two")
            .validate()
            .unwrap_err();
        assert_eq!(errors.get("email"), [INVALID_EMAIL.to_string()]);
        assert_eq!(errors.get("confirm_password"), [PASSWORDS_DIFFER.to_string()]);
        assert!(!errors.has("username"));
        assert!(!errors.has("password"));
    }

    #[test]
    fn login_needs_email_shape_and_password() {
        let form = LoginForm {
            email: "ada@example".into(),
            password: "   ".into(),
            csrf_token: String::new(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("email"), [INVALID_EMAIL.to_string()]);
        assert_eq!(errors.get("password"), [REQUIRED.to_string()]);

        let ok = LoginForm {
            email: "ADA@example.com ".into(),
            password: "secret".into(),
            csrf_token: String::new(),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.email, "ada@example.com");
    }
}
