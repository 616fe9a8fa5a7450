//! User model for storage and API.

use serde::{Deserialize, Serialize};
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Account role, chosen at registration and never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Role {
    User,
    Authority,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Authority => "authority",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User account stored in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Email address (document ID, case-sensitive as stored)
    pub email: String,
    /// Argon2 PHC string; never returned to clients
    pub password_hash: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    /// Street address (role `user` only)
    #[serde(default)]
    pub address: String,
    #[serde(default, alias = "city")]
    pub district: String,
    #[serde(default)]
    pub pincode: String,
    /// When the account was registered (ISO 8601)
    pub created_at: String,
}

impl User {
    /// Whether every address field needed to file a report is filled in.
    pub fn has_complete_address(&self) -> bool {
        [&self.address, &self.district, &self.pincode]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}
