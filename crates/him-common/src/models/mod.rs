//! Core domain models shared across all Project HIM crates.
//!
//! These are the "truth" types (what the database stores and the API
//! serializes) plus the request bodies the API accepts for each of them.

pub mod auth_identity;
pub mod class;
pub mod department;
pub mod department_member;
pub mod member;
pub mod member_class;
pub mod room;
pub mod user;

pub use auth_identity::*;
pub use class::*;
pub use department::*;
pub use department_member::*;
pub use member::*;
pub use member_class::*;
pub use room::*;
pub use user::*;

use serde::{Deserialize, Deserializer};

/// Patch fields that can be cleared: an absent key stays `None` (via
/// `#[serde(default)]`), an explicit `null` becomes `Some(None)`.
pub(crate) fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// `?limit=&offset=` query parameters for list endpoints.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    pub const DEFAULT_LIMIT: i64 = 50;
    pub const MAX_LIMIT: i64 = 100;

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_clamps() {
        let p = Pagination {
            limit: Some(1000),
            offset: Some(-3),
        };
        assert_eq!(p.limit(), 100);
        assert_eq!(p.offset(), 0);
        assert_eq!(Pagination::default().limit(), 50);
    }
}
