use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::clock_record::{ClockOutReason, ClockRecord, ClockStatus};
use crate::utils::geofence::{self, ClockInWindow, Coordinate, GeofenceError, clock_in_window_at};
use crate::utils::site_cache;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct ClockInRequest {
    #[schema(example = 42)]
    pub schedule_entry_id: u64,
    #[schema(example = 40.7128)]
    pub latitude: f64,
    #[schema(example = -74.0060)]
    pub longitude: f64,
}

#[derive(Deserialize, ToSchema)]
pub struct ClockOutRequest {
    #[schema(example = 40.7128)]
    pub latitude: f64,
    #[schema(example = -74.0060)]
    pub longitude: f64,
    /// Defaults to manual when omitted.
    #[schema(example = "manual", nullable = true)]
    pub reason: Option<ClockOutReason>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct WindowQuery {
    #[schema(example = "09:00")]
    pub shift_start_time: String,
    #[schema(example = "2024-03-05")]
    pub shift_date: String,
}

#[derive(sqlx::FromRow)]
struct EntryForClockIn {
    building_id: u64,
    cleaner_id: Option<u64>,
    shift_date: NaiveDate,
    start_time: NaiveTime,
}

const ACTIVE_STATUS: &str = "clocked_in";

/// Clock-in endpoint: time window first, then geofence, then the record.
#[utoipa::path(
    post,
    path = "/api/v1/attendance/clock-in",
    request_body = ClockInRequest,
    responses(
        (status = 200, description = "Clocked in", body = Object, example = json!({
            "message": "Clocked in",
            "distance_feet": 182.35
        })),
        (status = 400, description = "Outside the clock-in window or invalid location"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not assigned to this shift or outside the geofence"),
        (status = 409, description = "Already clocked in"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn clock_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<ClockInRequest>,
) -> actix_web::Result<impl Responder> {
    let cleaner_id = auth.require_cleaner_id()?;

    // 1. the shift being clocked into
    let entry = sqlx::query_as::<_, EntryForClockIn>(
        r#"
        SELECT building_id, cleaner_id, shift_date, start_time
        FROM schedule_entries
        WHERE id = ?
        "#,
    )
    .bind(payload.schedule_entry_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, cleaner_id, "Failed to fetch schedule entry");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let entry = match entry {
        Some(e) => e,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Schedule entry not found"
            })));
        }
    };

    if entry.cleaner_id != Some(cleaner_id) {
        return Err(actix_web::error::ErrorForbidden(
            "Shift is not assigned to this cleaner",
        ));
    }

    // 2. one active session per cleaner
    let already_active = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM clock_records WHERE cleaner_id = ? AND status = ? LIMIT 1)",
    )
    .bind(cleaner_id)
    .bind(ACTIVE_STATUS)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, cleaner_id, "Failed to check active clock record");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if already_active {
        return Ok(HttpResponse::Conflict().json(serde_json::json!({
            "message": "Already clocked in"
        })));
    }

    // 3. early clock-in window
    let window = clock_in_window_at(
        entry.shift_date.and_time(entry.start_time),
        config.early_clock_in_minutes,
        Local::now().naive_local(),
    );

    if !window.can_clock_in {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": window.message,
            "minutes_until_allowed": window.minutes_until_allowed
        })));
    }

    // 4. geofence against the building site
    let site = site_cache::get_site(pool.get_ref(), entry.building_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, building_id = entry.building_id, "Failed to load site");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Building not found"))?;

    let device = Coordinate::new(payload.latitude, payload.longitude);
    let result = match geofence::check_geofence(device, site.coordinate, site.radius_feet) {
        Ok(r) => r,
        Err(e @ GeofenceError::InvalidCoordinate { .. }) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": e.to_string()
            })));
        }
        Err(e) => {
            tracing::error!(error = %e, "Unexpected geofence failure");
            return Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ));
        }
    };

    if !result.is_within_radius {
        return Ok(HttpResponse::Forbidden().json(serde_json::json!({
            "message": format!(
                "You are {} ft from {}; clock-in requires being within {} ft",
                result.distance_feet, site.name, site.radius_feet
            ),
            "distance_feet": result.distance_feet
        })));
    }

    // 5. open the attendance session
    sqlx::query(
        r#"
        INSERT INTO clock_records
            (cleaner_id, schedule_entry_id, building_id,
             clock_in_time, clock_in_latitude, clock_in_longitude,
             clock_in_distance_feet, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(cleaner_id)
    .bind(payload.schedule_entry_id)
    .bind(entry.building_id)
    .bind(Utc::now())
    .bind(payload.latitude)
    .bind(payload.longitude)
    .bind(result.distance_feet)
    .bind(ClockStatus::ClockedIn.to_string())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, cleaner_id, "Clock-in insert failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Clocked in",
        "distance_feet": result.distance_feet
    })))
}

/// Clock-out endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/clock-out",
    request_body = ClockOutRequest,
    responses(
        (status = 200, description = "Clocked out", body = Object, example = json!({
            "message": "Clocked out",
            "total_minutes": 480
        })),
        (status = 400, description = "No active clock-in"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn clock_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<ClockOutRequest>,
) -> actix_web::Result<impl Responder> {
    let cleaner_id = auth.require_cleaner_id()?;

    let active = sqlx::query_as::<_, (u64, u64, chrono::DateTime<Utc>)>(
        r#"
        SELECT id, building_id, clock_in_time
        FROM clock_records
        WHERE cleaner_id = ? AND status = ?
        ORDER BY clock_in_time DESC
        LIMIT 1
        "#,
    )
    .bind(cleaner_id)
    .bind(ACTIVE_STATUS)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, cleaner_id, "Failed to fetch active clock record");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let (record_id, building_id, clock_in_time) = match active {
        Some(row) => row,
        None => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "No active clock-in found"
            })));
        }
    };

    // distance at clock-out is recorded but never blocks leaving
    let device = Coordinate::new(payload.latitude, payload.longitude);
    let distance_feet = match site_cache::get_site(pool.get_ref(), building_id).await {
        Ok(Some(site)) => geofence::check_geofence(device, site.coordinate, site.radius_feet)
            .ok()
            .map(|r| r.distance_feet),
        Ok(None) => None,
        Err(e) => {
            tracing::error!(error = %e, building_id, "Site lookup failed during clock-out");
            None
        }
    };

    let reason = payload.reason.unwrap_or(ClockOutReason::Manual);
    let now = Utc::now();
    let total_minutes = (now - clock_in_time).num_minutes().max(0);

    let result = sqlx::query(
        r#"
        UPDATE clock_records
        SET clock_out_time = ?,
            clock_out_latitude = ?,
            clock_out_longitude = ?,
            clock_out_distance_feet = ?,
            clock_out_reason = ?,
            total_minutes = ?,
            status = ?
        WHERE id = ?
        AND status = ?
        "#,
    )
    .bind(now)
    .bind(payload.latitude)
    .bind(payload.longitude)
    .bind(distance_feet)
    .bind(reason.to_string())
    .bind(total_minutes)
    .bind(reason.final_status().to_string())
    .bind(record_id)
    .bind(ACTIVE_STATUS)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, cleaner_id, "Clock-out failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "No active clock-in found"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Clocked out",
        "total_minutes": total_minutes
    })))
}

/// The caller's open attendance session, if any.
#[utoipa::path(
    get,
    path = "/api/v1/attendance/active",
    responses(
        (status = 200, description = "Active clock record", body = ClockRecord),
        (status = 204, description = "Not clocked in"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn active_record(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let cleaner_id = auth.require_cleaner_id()?;

    let record = sqlx::query_as::<_, ClockRecord>(
        r#"
        SELECT
            id, cleaner_id, schedule_entry_id, building_id,
            clock_in_time, clock_in_latitude, clock_in_longitude, clock_in_distance_feet,
            clock_out_time, clock_out_latitude, clock_out_longitude, clock_out_distance_feet,
            clock_out_reason, total_minutes, status
        FROM clock_records
        WHERE cleaner_id = ? AND status = ?
        ORDER BY clock_in_time DESC
        LIMIT 1
        "#,
    )
    .bind(cleaner_id)
    .bind(ACTIVE_STATUS)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, cleaner_id, "Failed to fetch active record");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match record {
        Some(r) => Ok(HttpResponse::Ok().json(r)),
        None => Ok(HttpResponse::NoContent().finish()),
    }
}

/// Window preview: "can I clock in yet?" for arbitrary shift strings.
/// Malformed input is a 400, never a wrong verdict.
#[utoipa::path(
    get,
    path = "/api/v1/attendance/window",
    params(WindowQuery),
    responses(
        (status = 200, description = "Window verdict", body = ClockInWindow),
        (status = 400, description = "Malformed time or date"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn clock_in_window(
    _auth: AuthUser,
    config: web::Data<Config>,
    query: web::Query<WindowQuery>,
) -> actix_web::Result<impl Responder> {
    let window = geofence::check_clock_in_time_window(
        &query.shift_start_time,
        &query.shift_date,
        config.early_clock_in_minutes,
    )
    .map_err(|e| actix_web::error::ErrorBadRequest(e.to_string()))?;

    Ok(HttpResponse::Ok().json(window))
}
