//! Third-party login identities linked to a member.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Google,
    Facebook,
    Apple,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Facebook => "facebook",
            Self::Apple => "apple",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "google" => Some(Self::Google),
            "facebook" => Some(Self::Facebook),
            "apple" => Some(Self::Apple),
            _ => None,
        }
    }
}

/// A (provider, provider account) pair owned by one member.
///
/// The pair is unique: one provider account signs in as exactly one member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthIdentity {
    pub id: Uuid,

    /// The owning member's id
    pub user_id: Uuid,

    pub provider: Provider,

    /// Account id issued by the provider
    pub provider_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LinkIdentityRequest {
    pub member_id: Uuid,
    pub provider: Provider,

    #[validate(length(min = 1, max = 255, message = "Provider id must be 1-255 characters"))]
    pub provider_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    pub provider: Provider,

    #[validate(length(min = 1, max = 255))]
    pub provider_id: String,
}
