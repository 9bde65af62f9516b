use serde::Deserialize;

use crate::error::RepoError;
use crate::forms::{self, Field, FormErrors, Rule};
use crate::users::repo::UserRepository;
use crate::users::repo_types::{EMAIL_MAX_LEN, USERNAME_MAX_LEN};

const USERNAME_RULES: &[Rule] = &[Rule::Required, Rule::MaxLength(USERNAME_MAX_LEN)];
const EMAIL_RULES: &[Rule] = &[Rule::Required, Rule::Email, Rule::MaxLength(EMAIL_MAX_LEN)];
const LOGIN_USERNAME_RULES: &[Rule] = &[Rule::Required];
const PASSWORD_RULES: &[Rule] = &[Rule::Required];
const PASSWORD2_RULES: &[Rule] = &[Rule::Required, Rule::EqualTo("password")];

/// Sign-in form body.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Checkbox; present only when ticked.
    #[serde(default)]
    pub remember_me: Option<String>,
}

impl LoginForm {
    /// Ticked unless absent, empty or `false`.
    pub fn remember(&self) -> bool {
        match self.remember_me.as_deref().map(str::trim) {
            Some(v) => !v.is_empty() && !v.eq_ignore_ascii_case("false"),
            None => false,
        }
    }

    pub fn validate(&mut self) -> FormErrors {
        self.username = self.username.trim().to_string();
        forms::check_fields(&[
            Field::new("username", &self.username, LOGIN_USERNAME_RULES),
            Field::new("password", &self.password, PASSWORD_RULES),
        ])
    }
}

/// Registration form body.
#[derive(Debug, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password2: String,
}

impl RegistrationForm {
    /// Static checks first; the store is only asked about fields that passed them.
    pub async fn validate(&mut self, users: &dyn UserRepository) -> Result<FormErrors, RepoError> {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_lowercase();

        let mut errors = forms::check_fields(&[
            Field::new("username", &self.username, USERNAME_RULES),
            Field::new("email", &self.email, EMAIL_RULES),
            Field::new("password", &self.password, PASSWORD_RULES),
            Field::new("password2", &self.password2, PASSWORD2_RULES),
        ]);

        if !errors.has("username") && !forms::username_available(users, &self.username, None).await? {
            errors.insert("username", forms::USERNAME_TAKEN);
        }
        if !errors.has("email") && !forms::email_available(users, &self.email, None).await? {
            errors.insert("email", forms::EMAIL_TAKEN);
        }
        Ok(errors)
    }
}
