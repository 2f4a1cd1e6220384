//! Member model: a person tracked by the church.
//!
//! Members are not login accounts; a member signs in through one or more
//! linked third-party identities (see [`super::auth_identity`]).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use uuid::Uuid;
use validator::Validate;

/// A member's role within the church.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Teacher,
    Leader,
    Assistant,
    Member,
    Guest,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Leader => "leader",
            Self::Assistant => "assistant",
            Self::Member => "member",
            Self::Guest => "guest",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Self::Student),
            "teacher" => Some(Self::Teacher),
            "leader" => Some(Self::Leader),
            "assistant" => Some(Self::Assistant),
            "member" => Some(Self::Member),
            "guest" => Some(Self::Guest),
            _ => None,
        }
    }
}

/// A soft reference to another member, stored by value inside a JSON list.
///
/// There is no foreign key behind `member_id`: the referenced member may have
/// been deleted, and readers must treat a dangling id as a normal outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRef {
    pub member_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub full_name: String,
    pub birthday: Option<NaiveDate>,
    pub personal_phone: Option<String>,
    pub work_phone: Option<String>,
    pub mobile_phone: Option<String>,
    pub address: Option<String>,

    /// Unique across members
    pub email: String,

    /// Never sent to clients
    #[serde(skip_serializing)]
    pub ssn: Option<String>,

    pub role: Role,
    pub line_id: Option<String>,

    /// Upload path relative to the upload directory
    pub photo: Option<String>,

    pub parents: Vec<MemberRef>,
    pub family_members: Vec<MemberRef>,

    /// Free-form data not covered by a department schema
    pub additional_fields: Option<serde_json::Value>,

    pub created_at: DateTime<Utc>,

    /// Refreshed on every write
    pub updated_at: DateTime<Utc>,
}

static PHONE_REGEX: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[0-9+()\-. ]+$").unwrap());

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMemberRequest {
    #[validate(length(min = 1, max = 255, message = "Full name must be 1-255 characters"))]
    pub full_name: String,

    pub birthday: Option<NaiveDate>,

    #[validate(length(max = 20), regex(path = *PHONE_REGEX, message = "Invalid phone number"))]
    pub personal_phone: Option<String>,

    #[validate(length(max = 20), regex(path = *PHONE_REGEX, message = "Invalid phone number"))]
    pub work_phone: Option<String>,

    #[validate(length(max = 20), regex(path = *PHONE_REGEX, message = "Invalid phone number"))]
    pub mobile_phone: Option<String>,

    #[validate(length(max = 500))]
    pub address: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 255))]
    pub email: String,

    #[validate(length(max = 20))]
    pub ssn: Option<String>,

    pub role: Role,

    #[validate(length(max = 255))]
    pub line_id: Option<String>,

    #[serde(default)]
    pub parents: Vec<MemberRef>,

    #[serde(default)]
    pub family_members: Vec<MemberRef>,

    pub additional_fields: Option<serde_json::Value>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateMemberRequest {
    #[validate(length(min = 1, max = 255))]
    pub full_name: Option<String>,

    pub birthday: Option<NaiveDate>,

    #[validate(length(max = 20), regex(path = *PHONE_REGEX, message = "Invalid phone number"))]
    pub personal_phone: Option<String>,

    #[validate(length(max = 20), regex(path = *PHONE_REGEX, message = "Invalid phone number"))]
    pub work_phone: Option<String>,

    #[validate(length(max = 20), regex(path = *PHONE_REGEX, message = "Invalid phone number"))]
    pub mobile_phone: Option<String>,

    #[validate(length(max = 500))]
    pub address: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    #[validate(length(max = 255))]
    pub email: Option<String>,

    #[validate(length(max = 20))]
    pub ssn: Option<String>,

    pub role: Option<Role>,

    #[validate(length(max = 255))]
    pub line_id: Option<String>,

    pub parents: Option<Vec<MemberRef>>,
    pub family_members: Option<Vec<MemberRef>>,

    /// `null` clears the stored data
    #[serde(default, deserialize_with = "super::nullable")]
    pub additional_fields: Option<Option<serde_json::Value>>,
}

impl Member {
    /// Fold a partial update into this member.
    pub fn apply(&mut self, update: UpdateMemberRequest) {
        if let Some(v) = update.full_name {
            self.full_name = v;
        }
        if let Some(v) = update.birthday {
            self.birthday = Some(v);
        }
        if let Some(v) = update.personal_phone {
            self.personal_phone = Some(v);
        }
        if let Some(v) = update.work_phone {
            self.work_phone = Some(v);
        }
        if let Some(v) = update.mobile_phone {
            self.mobile_phone = Some(v);
        }
        if let Some(v) = update.address {
            self.address = Some(v);
        }
        if let Some(v) = update.email {
            self.email = v;
        }
        if let Some(v) = update.ssn {
            self.ssn = Some(v);
        }
        if let Some(v) = update.role {
            self.role = v;
        }
        if let Some(v) = update.line_id {
            self.line_id = Some(v);
        }
        if let Some(v) = update.parents {
            self.parents = v;
        }
        if let Some(v) = update.family_members {
            self.family_members = v;
        }
        if let Some(v) = update.additional_fields {
            self.additional_fields = v;
        }
    }
}
