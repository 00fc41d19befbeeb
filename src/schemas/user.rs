use serde::{Deserialize, Serialize};

use crate::domain::User;

#[derive(Debug, Deserialize)]
pub(crate) struct UserSignup {
    pub(crate) email: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) password: String,
}

/// Public view of an account. Never carries the password hash.
#[derive(Debug, Serialize)]
pub(crate) struct UserProfile {
    pub(crate) email: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) disabled: bool,
}

impl UserProfile {
    pub(crate) fn from_entity(user: User) -> Self {
        Self {
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            disabled: user.disabled,
        }
    }
}
