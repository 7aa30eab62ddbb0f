use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

use crate::model::building::Building;
use crate::utils::geofence::{Coordinate, DEFAULT_RADIUS_FEET};

/// Geofence target for one building site.
#[derive(Debug, Clone)]
pub struct SiteGeofence {
    pub building_id: u64,
    pub name: String,
    pub coordinate: Coordinate,
    pub radius_feet: f64,
}

impl SiteGeofence {
    fn from_building(building: &Building) -> Self {
        Self {
            building_id: building.id,
            name: building.name.clone(),
            coordinate: building.coordinate(),
            radius_feet: building.geofence_radius_feet.unwrap_or(DEFAULT_RADIUS_FEET),
        }
    }
}

const SITE_COLUMNS: &str = r#"
    id, building_group_id, name, address,
    latitude, longitude, geofence_radius_feet, status
"#;

/// building_id => geofence target. Sites change rarely; clock-ins hit this
/// on every attempt.
pub static SITE_CACHE: Lazy<Cache<u64, SiteGeofence>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(10_000)
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

/// Cached lookup with a database fallback on miss.
pub async fn get_site(pool: &MySqlPool, building_id: u64) -> Result<Option<SiteGeofence>> {
    if let Some(site) = SITE_CACHE.get(&building_id).await {
        return Ok(Some(site));
    }

    let building = sqlx::query_as::<_, Building>(&format!(
        "SELECT {} FROM buildings WHERE id = ? AND status = 'active'",
        SITE_COLUMNS
    ))
    .bind(building_id)
    .fetch_optional(pool)
    .await?;

    match building {
        Some(building) => {
            let site = SiteGeofence::from_building(&building);
            SITE_CACHE.insert(building_id, site.clone()).await;
            Ok(Some(site))
        }
        None => Ok(None),
    }
}

/// Drop one site after its coordinates or radius change.
pub async fn invalidate(building_id: u64) {
    SITE_CACHE.invalidate(&building_id).await;
}

/// Load all active sites into the cache at startup (streamed, batched).
pub async fn warmup_site_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let sql = format!(
        "SELECT {} FROM buildings WHERE status = 'active'",
        SITE_COLUMNS
    );
    let mut stream = sqlx::query_as::<_, Building>(&sql).fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        batch.push(SiteGeofence::from_building(&row?));
        total_count += 1;

        if batch.len() >= batch_size {
            insert_batch(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch).await;
    }

    log::info!("Site cache warmup complete: {} active buildings", total_count);

    Ok(())
}

async fn insert_batch(sites: &[SiteGeofence]) {
    let futures: Vec<_> = sites
        .iter()
        .map(|s| SITE_CACHE.insert(s.building_id, s.clone()))
        .collect();

    futures::future::join_all(futures).await;
}
