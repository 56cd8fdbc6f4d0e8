use serde::{Deserialize, Serialize};

/// The two kinds of identity a token can carry.
///
/// Every boundary checks the variant explicitly instead of matching on a
/// free-form role string.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Kid,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Kid => write!(f, "kid"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i64,
    pub exp: usize,
    pub role: Role,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_kid(&self) -> bool {
        self.role == Role::Kid
    }
}

#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);
