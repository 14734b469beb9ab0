//! Users and posts.

use cairn_core::rules::{not_blank, valid_user_name};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use validator::Validate;

/// A registered user. Two users are equal when their user names are.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct User {
    /// Unique user name.
    #[validate(custom(function = "valid_user_name"))]
    pub user_name: String,

    /// Display name.
    #[validate(length(max = 128))]
    pub full_name: String,

    /// Contact address.
    #[validate(email)]
    pub email_address: String,
}

impl User {
    #[must_use]
    pub fn new(
        user_name: impl Into<String>,
        full_name: impl Into<String>,
        email_address: impl Into<String>,
    ) -> Self {
        Self {
            user_name: user_name.into(),
            full_name: full_name.into(),
            email_address: email_address.into(),
        }
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.user_name == other.user_name
    }
}

impl Eq for User {}

impl Hash for User {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.user_name.hash(state);
    }
}

/// A post written by a user.
///
/// `id` is `None` until the post has been stored. Two posts are equal when
/// both their author and id are.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Post {
    /// Author's user name.
    #[validate(custom(function = "valid_user_name"))]
    pub user_name: String,

    /// Identifier assigned on creation.
    pub id: Option<u32>,

    /// Submission time; posts are listed newest first.
    pub submit_date: DateTime<Utc>,

    /// Post body.
    #[validate(custom(function = "not_blank"), length(max = 4000))]
    pub content: String,
}

impl Post {
    /// Creates an unsaved post submitted now.
    #[must_use]
    pub fn new(user_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            id: None,
            submit_date: Utc::now(),
            content: content.into(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn with_submit_date(mut self, submit_date: DateTime<Utc>) -> Self {
        self.submit_date = submit_date;
        self
    }
}

impl PartialEq for Post {
    fn eq(&self, other: &Self) -> bool {
        self.user_name == other.user_name && self.id == other.id
    }
}

impl Eq for Post {}

impl Hash for Post {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.user_name.hash(state);
        self.id.hash(state);
    }
}
