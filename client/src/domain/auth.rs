//! Authentication form payloads: login credentials and registration.
//!
//! Constructors validate raw form input and report every failing field via
//! [`FieldErrors`], so nothing malformed reaches the API.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use zeroize::Zeroizing;

use super::validation::{FieldErrors, check_length};

/// Minimum password length accepted at registration.
pub const PASSWORD_MIN: usize = 8;
/// Maximum length for first and last names.
pub const NAME_MAX: usize = 50;

const REDACTED: &str = "<redacted>";

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

fn check_email(errors: &mut FieldErrors, raw: &str) -> String {
    let email = raw.trim();
    if email.is_empty() {
        errors.push("email", "email must not be empty");
    } else if !email_regex().is_match(email) {
        errors.push("email", "email must be a valid address");
    }
    email.to_owned()
}

/// Validated login credentials.
///
/// ## Invariants
/// - `email` is trimmed and shaped `local@domain.tld`.
/// - `password` is non-empty and kept verbatim, zeroised on drop.
///
/// # Examples
/// ```
/// use skillswap_client::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" ada@example.com ", "hunter22").unwrap();
/// assert_eq!(creds.email(), "ada@example.com");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Validate raw email/password input.
    ///
    /// # Errors
    ///
    /// Returns field errors for `email` and/or `password`.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();
        let email = check_email(&mut errors, email);
        if password.is_empty() {
            errors.push("password", "password must not be empty");
        }
        errors.into_result(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised email address.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password as typed.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    pub(crate) fn to_payload(&self) -> LoginPayload<'_> {
        LoginPayload {
            email: self.email(),
            password: self.password(),
        }
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &REDACTED)
            .finish()
    }
}

#[derive(Serialize)]
pub(crate) struct LoginPayload<'a> {
    email: &'a str,
    password: &'a str,
}

/// Raw registration form input.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm<'a> {
    /// Given name.
    pub first_name: &'a str,
    /// Family name.
    pub last_name: &'a str,
    /// Email address.
    pub email: &'a str,
    /// Chosen password.
    pub password: &'a str,
    /// Password typed a second time.
    pub confirm_password: &'a str,
}

/// Validated registration request.
///
/// ## Invariants
/// - names are trimmed, non-empty, at most [`NAME_MAX`] characters;
/// - password has at least [`PASSWORD_MIN`] characters, one letter and one
///   digit, and matches its confirmation.
#[derive(Clone, PartialEq, Eq)]
pub struct Registration {
    first_name: String,
    last_name: String,
    email: String,
    password: Zeroizing<String>,
}

impl Registration {
    /// Validate a registration form.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    ///
    /// # Examples
    /// ```
    /// use skillswap_client::domain::{Registration, RegistrationForm};
    ///
    /// let errors = Registration::try_from_form(&RegistrationForm {
    ///     first_name: "Ada",
    ///     last_name: "Lovelace",
    ///     email: "ada@example.com",
    ///     password: "engine42",
    ///     confirm_password: "engine24",
    /// })
    /// .unwrap_err();
    /// assert_eq!(errors.message_for("confirmPassword"), Some("passwords do not match"));
    /// ```
    pub fn try_from_form(form: &RegistrationForm<'_>) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();
        let first_name = check_length(&mut errors, "firstName", form.first_name, 1, NAME_MAX);
        let last_name = check_length(&mut errors, "lastName", form.last_name, 1, NAME_MAX);
        let email = check_email(&mut errors, form.email);

        let password = form.password;
        if password.chars().count() < PASSWORD_MIN {
            errors.push(
                "password",
                format!("password must be at least {PASSWORD_MIN} characters"),
            );
        } else if !password.chars().any(char::is_alphabetic)
            || !password.chars().any(|c| c.is_ascii_digit())
        {
            errors.push("password", "password must contain a letter and a digit");
        }
        if form.confirm_password != password {
            errors.push("confirmPassword", "passwords do not match");
        }

        errors.into_result(Self {
            first_name,
            last_name,
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Given name.
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    /// Family name.
    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    /// Normalised email address.
    pub fn email(&self) -> &str {
        &self.email
    }

    pub(crate) fn to_payload(&self) -> RegistrationPayload<'_> {
        RegistrationPayload {
            first_name: &self.first_name,
            last_name: &self.last_name,
            email: &self.email,
            password: self.password.as_str(),
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &REDACTED)
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegistrationPayload<'a> {
    first_name: &'a str,
    last_name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("", "pw", "email", "email must not be empty")]
    #[case("   ", "pw", "email", "email must not be empty")]
    #[case("not-an-email", "pw", "email", "email must be a valid address")]
    #[case("a@b", "pw", "email", "email must be a valid address")]
    #[case("ada@example.com", "", "password", "password must not be empty")]
    fn invalid_credentials(
        #[case] email: &str,
        #[case] password: &str,
        #[case] field: &str,
        #[case] message: &str,
    ) {
        let errors = LoginCredentials::try_from_parts(email, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(errors.message_for(field), Some(message));
    }

    #[test]
    fn credentials_keep_password_whitespace() {
        let creds = LoginCredentials::try_from_parts("ada@example.com", " pw ")
            .expect("valid inputs should succeed");
        assert_eq!(creds.password(), " pw ");
    }

    #[test]
    fn debug_output_hides_the_password() {
        let creds =
            LoginCredentials::try_from_parts("ada@example.com", "hunter22").expect("valid inputs");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("ada@example.com"));
        assert!(!rendered.contains("hunter22"));
    }

    #[test]
    fn login_payload_serialises_both_fields() {
        let creds =
            LoginCredentials::try_from_parts("ada@example.com", "secret").expect("valid inputs");
        let value = serde_json::to_value(creds.to_payload()).expect("serialise");
        assert_eq!(value, json!({ "email": "ada@example.com", "password": "secret" }));
    }

    fn form<'a>(password: &'a str, confirm: &'a str) -> RegistrationForm<'a> {
        RegistrationForm {
            first_name: " Ada ",
            last_name: "Lovelace",
            email: "ada@example.com",
            password,
            confirm_password: confirm,
        }
    }

    #[rstest]
    #[case("short1", "password must be at least 8 characters")]
    #[case("onlyletters", "password must contain a letter and a digit")]
    #[case("12345678", "password must contain a letter and a digit")]
    fn weak_passwords_are_rejected(#[case] password: &str, #[case] message: &str) {
        let errors = Registration::try_from_form(&form(password, password))
            .expect_err("weak password must fail");
        assert_eq!(errors.message_for("password"), Some(message));
    }

    #[test]
    fn registration_reports_every_failing_field() {
        let errors = Registration::try_from_form(&RegistrationForm {
            first_name: "",
            last_name: "",
            email: "nope",
            password: "engine42",
            confirm_password: "",
        })
        .expect_err("form must fail");
        let fields = errors
            .errors()
            .iter()
            .map(|error| error.field)
            .collect::<Vec<_>>();
        assert_eq!(fields, vec!["firstName", "lastName", "email", "confirmPassword"]);
    }

    #[test]
    fn registration_payload_uses_camel_case() {
        let registration =
            Registration::try_from_form(&form("engine42", "engine42")).expect("valid form");
        assert_eq!(registration.first_name(), "Ada");
        let value = serde_json::to_value(registration.to_payload()).expect("serialise");
        assert_eq!(
            value,
            json!({
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": "ada@example.com",
                "password": "engine42",
            })
        );
    }
}
