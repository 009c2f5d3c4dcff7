use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug, Clone)]
pub struct UserIn {
    pub email: String,
}

impl UserIn {
    /// Minimal shape check: one `@` with something on both sides.
    pub fn is_valid_email(&self) -> bool {
        match self.email.trim().split_once('@') {
            Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
            None => false,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub email: String,
    #[serde(skip_serializing)]
    pub access_token: String,
}
