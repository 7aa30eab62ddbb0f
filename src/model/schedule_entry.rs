use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ScheduleEntry {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1)]
    pub building_id: u64,

    /// NULL until a cleaner is assigned.
    #[schema(example = 7, nullable = true)]
    pub cleaner_id: Option<u64>,

    #[schema(example = "2024-03-05", value_type = String, format = "date")]
    pub shift_date: NaiveDate,

    #[schema(example = "09:00:00", value_type = String)]
    pub start_time: NaiveTime,

    #[schema(example = "17:00:00", value_type = String)]
    pub end_time: NaiveTime,

    #[schema(example = "scheduled")]
    pub status: String,
}
