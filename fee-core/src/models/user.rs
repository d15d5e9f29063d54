use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{ServiceCategory, UnknownVariant};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is a valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Customer,
    Consultant,
    Admin,
}

impl UserRole {
    pub const ALL: [UserRole; 3] = [UserRole::Customer, UserRole::Consultant, UserRole::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Consultant => "consultant",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for UserRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "customer" => Ok(Self::Customer),
            "consultant" => Ok(Self::Consultant),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownVariant::new("user role", other)),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    /// Practice areas; only meaningful for consultants.
    pub specializations: Vec<ServiceCategory>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// For creating new users (no id or timestamp)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub specializations: Vec<ServiceCategory>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UserValidationError {
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),

    #[error("name is required")]
    EmptyName,
}

impl NewUser {
    /// Trim and lower-case the email, trim the name, and check both.
    pub fn normalized(mut self) -> Result<Self, UserValidationError> {
        self.email = self.email.trim().to_lowercase();
        self.name = self.name.trim().to_string();

        if !EMAIL_PATTERN.is_match(&self.email) {
            return Err(UserValidationError::InvalidEmail(self.email));
        }
        if self.name.is_empty() {
            return Err(UserValidationError::EmptyName);
        }
        Ok(self)
    }
}
