//! Enrollment of a member in a class, with per-date attendance.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

/// Attendance outcomes. Anything else is rejected when decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Excused,
    Tardy,
}

/// Date → status, ordered by date.
pub type Attendance = BTreeMap<NaiveDate, AttendanceStatus>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberClass {
    pub id: Uuid,
    pub member_id: Uuid,
    pub class_id: Uuid,

    /// Set once at enrollment
    pub enrolled_at: DateTime<Utc>,

    pub attendance: Attendance,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EnrollRequest {
    pub member_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct MarkAttendanceRequest {
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}
