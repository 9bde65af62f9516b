use serde::Deserialize;

use crate::error::RepoError;
use crate::forms::{self, Field, FormErrors, Rule};
use crate::users::repo::UserRepository;
use crate::users::repo_types::{ProfileUpdate, User, ABOUT_ME_MAX_LEN, USERNAME_MAX_LEN};

const USERNAME_RULES: &[Rule] = &[Rule::Required, Rule::MaxLength(USERNAME_MAX_LEN)];
const ABOUT_ME_RULES: &[Rule] = &[Rule::MaxLength(ABOUT_ME_MAX_LEN)];

/// Profile edit form body.
#[derive(Debug, Default, Deserialize)]
pub struct EditProfileForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub about_me: String,
}

impl EditProfileForm {
    /// Pre-populated from the stored profile.
    pub fn from_user(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            about_me: user.about_me.clone().unwrap_or_default(),
        }
    }

    /// Keeping one's own username is not a conflict.
    pub async fn validate(
        &mut self,
        users: &dyn UserRepository,
        owner: i64,
    ) -> Result<FormErrors, RepoError> {
        self.username = self.username.trim().to_string();
        self.about_me = self.about_me.trim().to_string();

        let mut errors = forms::check_fields(&[
            Field::new("username", &self.username, USERNAME_RULES),
            Field::new("about_me", &self.about_me, ABOUT_ME_RULES),
        ]);

        if !errors.has("username")
            && !forms::username_available(users, &self.username, Some(owner)).await?
        {
            errors.insert("username", forms::USERNAME_TAKEN);
        }
        Ok(errors)
    }

    pub fn to_update(&self) -> ProfileUpdate {
        let about_me = self.about_me.trim();
        ProfileUpdate {
            username: self.username.clone(),
            about_me: (!about_me.is_empty()).then(|| about_me.to_string()),
        }
    }
}
