//! Field-level form checks: an explicit ordered rule list per field, followed by
//! uniqueness lookups against the user store for fields that passed.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{RepoError, UniqueField};
use crate::users::repo::UserRepository;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_EMAIL: &str = "Invalid email address.";
pub const USERNAME_TAKEN: &str = "Please use a different username.";
pub const EMAIL_TAKEN: &str = "Please use a different email address.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    Email,
    MaxLength(usize),
    /// Must equal the value of the named field.
    EqualTo(&'static str),
}

/// One submitted field and the rules it is checked against, in order.
#[derive(Debug, Clone, Copy)]
pub struct Field<'a> {
    pub name: &'static str,
    pub value: &'a str,
    pub rules: &'static [Rule],
}

impl<'a> Field<'a> {
    pub fn new(name: &'static str, value: &'a str, rules: &'static [Rule]) -> Self {
        Self { name, value, rules }
    }
}

/// Rejection reason per field; empty means the submission is accepted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<&'static str, String>);

impl FormErrors {
    pub fn accepted(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Keeps the first reason recorded for a field.
    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn check_rule(rule: Rule, field: &Field<'_>, fields: &[Field<'_>]) -> Result<(), String> {
    match rule {
        Rule::Required if field.value.trim().is_empty() => Err(REQUIRED.into()),
        Rule::Email if !is_valid_email(field.value) => Err(INVALID_EMAIL.into()),
        Rule::MaxLength(max) if field.value.chars().count() > max => {
            Err(format!("Field cannot be longer than {max} characters."))
        }
        Rule::EqualTo(other) => {
            let other_value = fields.iter().find(|f| f.name == other).map(|f| f.value);
            if other_value == Some(field.value) {
                Ok(())
            } else {
                Err(format!("Field must be equal to {other}."))
            }
        }
        _ => Ok(()),
    }
}

/// Runs every field's rules in order; a field stops at its first failing rule.
pub fn check_fields(fields: &[Field<'_>]) -> FormErrors {
    let mut errors = FormErrors::default();
    for field in fields {
        if let Some(message) = field
            .rules
            .iter()
            .find_map(|rule| check_rule(*rule, field, fields).err())
        {
            errors.insert(field.name, message);
        }
    }
    errors
}

/// Message for a store conflict detected at commit time.
pub fn taken_message(field: UniqueField) -> &'static str {
    match field {
        UniqueField::Username => USERNAME_TAKEN,
        UniqueField::Email => EMAIL_TAKEN,
    }
}

/// Free unless another account holds it. `owner` is the account being edited, if any.
pub async fn username_available(
    users: &dyn UserRepository,
    username: &str,
    owner: Option<i64>,
) -> Result<bool, RepoError> {
    Ok(match users.find_by_username(username).await? {
        Some(existing) => Some(existing.id) == owner,
        None => true,
    })
}

pub async fn email_available(
    users: &dyn UserRepository,
    email: &str,
    owner: Option<i64>,
) -> Result<bool, RepoError> {
    Ok(match users.find_by_email(email).await? {
        Some(existing) => Some(existing.id) == owner,
        None => true,
    })
}
