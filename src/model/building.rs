use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::utils::geofence::Coordinate;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Building {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 3)]
    pub building_group_id: u64,

    #[schema(example = "Riverside Tower")]
    pub name: String,

    #[schema(example = "1 Main St")]
    pub address: String,

    #[schema(example = 40.7128)]
    pub latitude: f64,

    #[schema(example = -74.0060)]
    pub longitude: f64,

    /// NULL means the site uses the configured default radius.
    #[schema(example = 300.0, nullable = true)]
    pub geofence_radius_feet: Option<f64>,

    #[schema(example = "active")]
    pub status: String,
}

impl Building {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}
