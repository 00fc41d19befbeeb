use serde::{Deserialize, Serialize};

/// OAuth2 password grant form body accepted by the token endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct PasswordGrantForm {
    pub(crate) username: String,
    pub(crate) password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    pub(crate) token_type: String,
}

impl TokenResponse {
    pub(crate) fn bearer(access_token: String) -> Self {
        Self { access_token, token_type: "bearer".to_string() }
    }
}
