use crate::auth::auth::AuthUser;
use crate::model::schedule_entry::ScheduleEntry;
use crate::utils::time_off_cache::TimeOffCache;
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateScheduleEntry {
    #[schema(example = 1)]
    pub building_id: u64,
    #[schema(example = "2024-03-05", format = "date", value_type = String)]
    pub shift_date: NaiveDate,
    #[schema(example = "09:00:00", value_type = String)]
    pub start_time: NaiveTime,
    #[schema(example = "17:00:00", value_type = String)]
    pub end_time: NaiveTime,
}

#[derive(Deserialize, ToSchema)]
pub struct AssignCleaner {
    #[schema(example = 7)]
    pub cleaner_id: u64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ScheduleQuery {
    #[schema(example = "2024-03-05", format = "date", value_type = String, nullable = true)]
    pub shift_date: Option<NaiveDate>,
    #[schema(example = 1)]
    pub building_id: Option<u64>,
    #[schema(example = 7)]
    pub cleaner_id: Option<u64>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct ScheduleListResponse {
    pub data: Vec<ScheduleEntry>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// Create schedule entry (unassigned)
#[utoipa::path(
    post,
    path = "/api/v1/schedule",
    request_body = CreateScheduleEntry,
    responses(
        (status = 200, description = "Entry created", body = Object, example = json!({
            "message": "Schedule entry created"
        })),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Schedule"
)]
pub async fn create_entry(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateScheduleEntry>,
) -> actix_web::Result<impl Responder> {
    auth.require_supervisor_or_admin()?;

    if payload.start_time >= payload.end_time {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "start_time must be before end_time"
        })));
    }

    sqlx::query(
        r#"
        INSERT INTO schedule_entries (building_id, shift_date, start_time, end_time, status)
        VALUES (?, ?, ?, ?, 'scheduled')
        "#,
    )
    .bind(payload.building_id)
    .bind(payload.shift_date)
    .bind(payload.start_time)
    .bind(payload.end_time)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create schedule entry");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Schedule entry created"
    })))
}

/// Assign a cleaner to an entry.
///
/// The assignment is refused while the cleaner has approved time off
/// covering the shift date. A store failure refuses too: "unknown" is
/// never treated as "available".
#[utoipa::path(
    put,
    path = "/api/v1/schedule/{entry_id}/assign",
    params(
        ("entry_id" = u64, Path, description = "Schedule entry ID")
    ),
    request_body = AssignCleaner,
    responses(
        (status = 200, description = "Cleaner assigned"),
        (status = 404, description = "Entry or cleaner not found"),
        (status = 409, description = "Cleaner has approved time off that date", body = Object, example = json!({
            "message": "Cleaner has approved time off on 2024-03-05",
            "reason": "medical appointment"
        })),
        (status = 503, description = "Time-off store unavailable; assignment refused"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Schedule"
)]
pub async fn assign_cleaner(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<AssignCleaner>,
) -> actix_web::Result<impl Responder> {
    auth.require_supervisor_or_admin()?;

    let entry_id = path.into_inner();
    let cleaner_id = payload.cleaner_id;

    let shift_date = sqlx::query_scalar::<_, NaiveDate>(
        "SELECT shift_date FROM schedule_entries WHERE id = ?",
    )
    .bind(entry_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, entry_id, "Failed to fetch schedule entry");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let shift_date = match shift_date {
        Some(d) => d,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Schedule entry not found"
            })));
        }
    };

    let cleaner_exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM cleaners WHERE id = ? AND status = 'active' LIMIT 1)",
    )
    .bind(cleaner_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, cleaner_id, "Failed to fetch cleaner");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if !cleaner_exists {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Cleaner not found or inactive"
        })));
    }

    // availability check against approved time off for that day
    let cache = TimeOffCache::fetch_approved(pool.get_ref(), shift_date, shift_date)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch approved time-off; refusing assignment");
            actix_web::error::ErrorServiceUnavailable("Time-off store unavailable")
        })?;

    if let Some(conflict) = cache.details_for(cleaner_id, shift_date) {
        return Ok(HttpResponse::Conflict().json(serde_json::json!({
            "message": format!("Cleaner has approved time off on {}", shift_date),
            "reason": conflict.reason,
            "request_id": conflict.id
        })));
    }

    let result = sqlx::query(
        r#"
        UPDATE schedule_entries
        SET cleaner_id = ?
        WHERE id = ?
        "#,
    )
    .bind(cleaner_id)
    .bind(entry_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, entry_id, "Failed to assign cleaner");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Schedule entry not found"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Cleaner assigned"
    })))
}

/// List schedule entries
#[utoipa::path(
    get,
    path = "/api/v1/schedule",
    params(ScheduleQuery),
    responses(
        (status = 200, description = "Paginated schedule list", body = ScheduleListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Schedule"
)]
pub async fn list_entries(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ScheduleQuery>,
) -> actix_web::Result<impl Responder> {
    // cleaners may list their own shifts; supervisors see everything
    if auth.is_cleaner() {
        let own_id = auth.require_cleaner_id()?;
        if query.cleaner_id != Some(own_id) {
            return Err(actix_web::error::ErrorForbidden(
                "Cleaners may only list their own shifts",
            ));
        }
    }

    let per_page = query.per_page.unwrap_or(20).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut u64_binds: Vec<u64> = Vec::new();
    let mut date_bind: Option<NaiveDate> = None;

    if let Some(building_id) = query.building_id {
        where_sql.push_str(" AND building_id = ?");
        u64_binds.push(building_id);
    }
    if let Some(cleaner_id) = query.cleaner_id {
        where_sql.push_str(" AND cleaner_id = ?");
        u64_binds.push(cleaner_id);
    }
    if let Some(shift_date) = query.shift_date {
        where_sql.push_str(" AND shift_date = ?");
        date_bind = Some(shift_date);
    }

    let count_sql = format!("SELECT COUNT(*) FROM schedule_entries{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for v in &u64_binds {
        count_q = count_q.bind(*v);
    }
    if let Some(d) = date_bind {
        count_q = count_q.bind(d);
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count schedule entries");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT id, building_id, cleaner_id, shift_date, start_time, end_time, status
        FROM schedule_entries
        {}
        ORDER BY shift_date, start_time
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, ScheduleEntry>(&data_sql);
    for v in &u64_binds {
        data_q = data_q.bind(*v);
    }
    if let Some(d) = date_bind {
        data_q = data_q.bind(d);
    }

    let entries = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch schedule entries");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(ScheduleListResponse {
        data: entries,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}
