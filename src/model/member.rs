use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Type-safe identifier for Members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId(pub u32);

impl From<u32> for MemberId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "member_{}", self.0)
    }
}

/// A registered library member.
///
/// Members are read by the lending engine to decide checkout eligibility.
/// Only `is_active_member` ever changes after registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub username: String,
    pub date_of_membership: NaiveDate,
    pub is_active_member: bool,
}

/// Payload for registering a new member.
#[derive(Debug, Clone)]
pub struct MemberCreate {
    pub username: String,
    /// Defaults to today when absent.
    pub date_of_membership: Option<NaiveDate>,
}

impl MemberCreate {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            date_of_membership: None,
        }
    }
}

impl Member {
    /// Builds an active member from a registration payload.
    pub fn from_create(id: MemberId, params: MemberCreate) -> Self {
        Self {
            id,
            username: params.username,
            date_of_membership: params
                .date_of_membership
                .unwrap_or_else(|| Utc::now().date_naive()),
            is_active_member: true,
        }
    }
}

impl Display for Member {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.username)
    }
}
