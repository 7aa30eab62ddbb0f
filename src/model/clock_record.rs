use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClockOutReason {
    Manual,
    AutoGeofence,
    ShiftEnded,
    Admin,
}

impl ClockOutReason {
    /// Anything other than a manual clock-out closes the record as
    /// `auto_clocked_out`.
    pub fn final_status(&self) -> ClockStatus {
        match self {
            ClockOutReason::Manual => ClockStatus::ClockedOut,
            _ => ClockStatus::AutoClockedOut,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClockStatus {
    ClockedIn,
    ClockedOut,
    AutoClockedOut,
}

/// One attendance session. Created on a successful clock-in, mutated
/// exactly once on clock-out, never deleted.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ClockRecord {
    pub id: u64,
    pub cleaner_id: u64,
    pub schedule_entry_id: u64,
    pub building_id: u64,

    #[schema(value_type = String, format = "date-time")]
    pub clock_in_time: DateTime<Utc>,
    pub clock_in_latitude: f64,
    pub clock_in_longitude: f64,
    #[schema(example = 182.35)]
    pub clock_in_distance_feet: f64,

    #[schema(value_type = String, format = "date-time", nullable = true)]
    pub clock_out_time: Option<DateTime<Utc>>,
    pub clock_out_latitude: Option<f64>,
    pub clock_out_longitude: Option<f64>,
    pub clock_out_distance_feet: Option<f64>,
    #[schema(example = "manual", nullable = true)]
    pub clock_out_reason: Option<String>,

    #[schema(example = 480, nullable = true)]
    pub total_minutes: Option<i64>,

    #[schema(example = "clocked_in")]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_out_closes_normally() {
        assert_eq!(ClockOutReason::Manual.final_status(), ClockStatus::ClockedOut);
    }

    #[test]
    fn non_manual_reasons_close_as_auto() {
        for reason in [
            ClockOutReason::AutoGeofence,
            ClockOutReason::ShiftEnded,
            ClockOutReason::Admin,
        ] {
            assert_eq!(reason.final_status(), ClockStatus::AutoClockedOut);
        }
    }

    #[test]
    fn reason_strings_round_trip() {
        let reason: ClockOutReason = "auto_geofence".parse().unwrap();
        assert_eq!(reason, ClockOutReason::AutoGeofence);
        assert_eq!(ClockStatus::AutoClockedOut.to_string(), "auto_clocked_out");
    }
}
