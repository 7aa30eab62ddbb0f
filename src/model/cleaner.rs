use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "cleaner_code": "CLN-001",
        "first_name": "Jane",
        "last_name": "Doe",
        "email": "jane.doe@cleanco.com",
        "phone": "+15550100",
        "hourly_rate": 22.5,
        "hire_date": "2024-01-01",
        "status": "active"
    })
)]
pub struct Cleaner {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "CLN-001")]
    pub cleaner_code: String,

    #[schema(example = "Jane")]
    pub first_name: String,

    #[schema(example = "Doe")]
    pub last_name: String,

    #[schema(example = "jane.doe@cleanco.com")]
    pub email: String,

    #[schema(example = "+15550100", nullable = true)]
    pub phone: Option<String>,

    #[schema(example = 22.5)]
    pub hourly_rate: f64,

    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub hire_date: NaiveDate,

    #[schema(example = "active")]
    pub status: String,
}

impl Cleaner {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
