//! Identifier and timestamp generation.
//!
//! Every entity gets its id and its timestamps from the process that creates
//! it, never from the storage engine. UUID v7 keeps ids time-ordered, which
//! gives list endpoints a stable creation order for free.

use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

/// Generate a fresh entity id.
pub fn new_id() -> Uuid {
    Uuid::now_v7()
}

/// The current time at the precision timestamps are stored with
/// (microseconds), so an entity returned from a write equals what a later
/// read decodes.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
