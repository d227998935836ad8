//! Wire types for the authentication, registration and profile endpoints

use serde::{Deserialize, Serialize};

/// Body of `POST login/`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Answer of `POST login/`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access: String,
}

/// Body of `POST register/`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Technician record nested in the profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TechnicianProfile {
    pub id: i64,
    pub company: i64,
    #[serde(default)]
    pub is_admin: bool,
}

/// Current user, as returned by `GET users/me/`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub technician_profile: Option<TechnicianProfile>,
}

impl UserProfile {
    /// Linked to a technician (account activated for a company)
    pub fn is_activated(&self) -> bool {
        self.technician_profile.is_some()
    }

    /// Company administrator
    pub fn is_admin(&self) -> bool {
        self.technician_profile
            .as_ref()
            .map(|t| t.is_admin)
            .unwrap_or(false)
    }

    /// "First Last", or the username when no name is set
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}
