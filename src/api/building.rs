use crate::{
    auth::auth::AuthUser,
    model::building::Building,
    utils::db_utils::{build_update_sql, execute_update},
    utils::geofence::Coordinate,
    utils::site_cache,
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateBuilding {
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
    #[schema(example = 300.0, nullable = true)]
    pub geofence_radius_feet: Option<f64>,
}

#[derive(Serialize, ToSchema)]
pub struct BuildingListResponse {
    pub data: Vec<Building>,
    pub total: i64,
}

const UPDATABLE_COLUMNS: &[&str] = &[
    "building_group_id",
    "name",
    "address",
    "latitude",
    "longitude",
    "geofence_radius_feet",
    "status",
];

/// Create Building
#[utoipa::path(
    post,
    path = "/api/v1/buildings",
    request_body = CreateBuilding,
    responses(
        (status = 200, description = "Building created"),
        (status = 400, description = "Invalid site coordinate"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Building",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_building(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateBuilding>,
) -> actix_web::Result<impl Responder> {
    auth.require_supervisor_or_admin()?;

    // a site with the unset sentinel could never pass a clock-in geofence
    let site = Coordinate::new(payload.latitude, payload.longitude);
    if !site.is_valid() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Invalid site coordinate"
        })));
    }

    if payload.geofence_radius_feet.is_some_and(|r| r <= 0.0) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "geofence_radius_feet must be positive"
        })));
    }

    sqlx::query(
        r#"
        INSERT INTO buildings
        (building_group_id, name, address, latitude, longitude, geofence_radius_feet, status)
        VALUES (?, ?, ?, ?, ?, ?, 'active')
        "#,
    )
    .bind(payload.building_group_id)
    .bind(&payload.name)
    .bind(&payload.address)
    .bind(payload.latitude)
    .bind(payload.longitude)
    .bind(payload.geofence_radius_feet)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create building");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Building created"
    })))
}

/// List active buildings
#[utoipa::path(
    get,
    path = "/api/v1/buildings",
    responses(
        (status = 200, description = "Building list", body = BuildingListResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Building",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_buildings(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let buildings = sqlx::query_as::<_, Building>(
        r#"
        SELECT id, building_group_id, name, address,
               latitude, longitude, geofence_radius_feet, status
        FROM buildings
        WHERE status = 'active'
        ORDER BY name
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch buildings");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let total = buildings.len() as i64;

    Ok(HttpResponse::Ok().json(BuildingListResponse {
        data: buildings,
        total,
    }))
}

/// Get Building by ID
#[utoipa::path(
    get,
    path = "/api/v1/buildings/{building_id}",
    params(
        ("building_id", Path, description = "Building ID")
    ),
    responses(
        (status = 200, description = "Building found", body = Building),
        (status = 404, description = "Building not found")
    ),
    tag = "Building",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_building(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let building_id = path.into_inner();

    let building = sqlx::query_as::<_, Building>(
        r#"
        SELECT id, building_group_id, name, address,
               latitude, longitude, geofence_radius_feet, status
        FROM buildings
        WHERE id = ?
        "#,
    )
    .bind(building_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, building_id, "Failed to fetch building");
        ErrorInternalServerError("Internal Server Error")
    })?;

    match building {
        Some(b) => Ok(HttpResponse::Ok().json(b)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Building not found"
        }))),
    }
}

/// Update Building (drops the cached geofence target)
#[utoipa::path(
    put,
    path = "/api/v1/buildings/{building_id}",
    params(
        ("building_id", Path, description = "Building ID")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Building updated"),
        (status = 400, description = "Unknown field in payload"),
        (status = 404, description = "Building not found")
    ),
    tag = "Building",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_building(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_supervisor_or_admin()?;

    let building_id = path.into_inner();

    let update = build_update_sql("buildings", &body, UPDATABLE_COLUMNS, "id", building_id)?;

    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().body("Building not found"));
    }

    // stale coordinates or radius must not gate the next clock-in
    site_cache::invalidate(building_id as u64).await;

    Ok(HttpResponse::Ok().body("Building updated successfully"))
}
