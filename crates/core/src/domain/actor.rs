use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Staff,
    Admin,
}

impl Role {
    /// Maps an identity-provider role claim. Only the exact value `Admin` grants admin rights.
    pub fn from_claim(claim: &str) -> Self {
        if claim == "Admin" {
            Self::Admin
        } else {
            Self::Staff
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Staff => "Staff",
            Self::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated caller requesting a quotation operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self { user_id: user_id.into(), role }
    }

    pub fn from_claims(user_id: impl Into<String>, role_claim: &str) -> Self {
        Self::new(user_id, Role::from_claim(role_claim))
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
