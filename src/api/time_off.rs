use crate::auth::auth::AuthUser;
use crate::model::cleaner::Cleaner;
use crate::model::time_off_request::{RequestStatus, RequestType, TimeOffRequest};
use crate::utils::time_off_cache::TimeOffCache;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateTimeOff {
    #[schema(example = "date_range")]
    pub request_type: RequestType,

    #[schema(example = "2024-03-05", format = "date", value_type = String, nullable = true)]
    pub shift_date: Option<NaiveDate>,

    #[schema(example = "2024-01-10", format = "date", value_type = String, nullable = true)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2024-01-15", format = "date", value_type = String, nullable = true)]
    pub end_date: Option<NaiveDate>,

    #[schema(example = 12, nullable = true)]
    pub recurring_shift_id: Option<u64>,
    #[schema(value_type = Vec<String>, example = json!(["2024-02-01", "2024-02-08"]), nullable = true)]
    pub requested_dates: Option<Vec<NaiveDate>>,

    #[schema(example = "medical appointment")]
    pub reason: String,
    #[schema(example = "back by Thursday", nullable = true)]
    pub notes: Option<String>,
}

impl CreateTimeOff {
    /// Exactly one date shape must be populated and it must match
    /// `request_type`.
    fn validate_shape(&self) -> Result<(), &'static str> {
        let has_single = self.shift_date.is_some();
        let has_range = self.start_date.is_some() || self.end_date.is_some();
        let has_recurring = self.requested_dates.as_ref().is_some_and(|d| !d.is_empty());

        match self.request_type {
            RequestType::SingleShift => {
                if !has_single || has_range || has_recurring {
                    return Err("single_shift requires shift_date and no other date fields");
                }
            }
            RequestType::DateRange => {
                if has_single || has_recurring {
                    return Err("date_range must not carry shift_date or requested_dates");
                }
                match (self.start_date, self.end_date) {
                    (Some(start), Some(end)) if start <= end => {}
                    (Some(_), Some(_)) => return Err("start_date cannot be after end_date"),
                    _ => return Err("date_range requires start_date and end_date"),
                }
            }
            RequestType::RecurringInstances => {
                if !has_recurring || has_single || has_range {
                    return Err(
                        "recurring_instances requires requested_dates and no other date fields",
                    );
                }
            }
        }

        Ok(())
    }
}

#[derive(Deserialize, ToSchema)]
pub struct DeclineTimeOff {
    #[schema(example = "shift already understaffed")]
    pub reason: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct TimeOffFilter {
    #[schema(example = 7)]
    /// Filter by cleaner ID
    pub cleaner_id: Option<u64>,
    #[schema(example = "pending")]
    /// Filter by request status
    pub status: Option<String>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>, // 1-based
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>, // items per page
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

#[derive(Serialize, ToSchema)]
pub struct TimeOffListResponse {
    pub data: Vec<TimeOffRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AvailabilityQuery {
    #[schema(example = 7)]
    pub cleaner_id: u64,
    /// Display name for legacy rows that predate stable cleaner ids.
    #[schema(example = "Jane Doe", nullable = true)]
    pub cleaner_name: Option<String>,
    #[schema(example = "2024-03-05", format = "date", value_type = String)]
    pub date: NaiveDate,
}

#[derive(Serialize, ToSchema)]
pub struct AvailabilityResponse {
    pub available: bool,
    #[schema(nullable = true)]
    pub request: Option<TimeOffRequest>,
}

const SELECT_COLUMNS: &str = r#"
    id, cleaner_id, cleaner_name, request_type,
    shift_date, start_date, end_date,
    recurring_shift_id, requested_dates,
    reason, notes, status,
    reviewed_by, reviewed_at, decline_reason, created_at
"#;

/* =========================
Create time-off request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/time-off",
    request_body(
        content = CreateTimeOff,
        description = "Time-off request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Time-off request submitted",
         body = Object,
         example = json!({
            "message": "Time-off request submitted",
            "status": "pending"
         })
        ),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "TimeOff"
)]
pub async fn create_time_off(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateTimeOff>,
) -> actix_web::Result<impl Responder> {
    let cleaner_id = auth.require_cleaner_id()?;

    // 1. enforce the one-shape-per-request invariant
    if let Err(msg) = payload.validate_shape() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({ "message": msg })));
    }

    if payload.reason.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "reason must not be empty"
        })));
    }

    // 2. snapshot the display name (legacy rows are keyed by it)
    let cleaner_name = sqlx::query_as::<_, Cleaner>(
        r#"
        SELECT id, cleaner_code, first_name, last_name, email,
               phone, hourly_rate, hire_date, status
        FROM cleaners
        WHERE id = ?
        "#,
    )
    .bind(cleaner_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, cleaner_id, "Failed to fetch cleaner");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?
    .map(|c| c.display_name())
    .ok_or_else(|| actix_web::error::ErrorForbidden("Cleaner profile not found"))?;

    let requested_dates_json = match &payload.requested_dates {
        Some(dates) => Some(serde_json::to_string(dates).map_err(|e| {
            tracing::error!(error = %e, "Failed to encode requested_dates");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?),
        None => None,
    };

    // 3. insert request
    sqlx::query(
        r#"
        INSERT INTO time_off_requests
            (cleaner_id, cleaner_name, request_type,
             shift_date, start_date, end_date,
             recurring_shift_id, requested_dates,
             reason, notes, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending')
        "#,
    )
    .bind(cleaner_id)
    .bind(&cleaner_name)
    .bind(payload.request_type.to_string())
    .bind(payload.shift_date)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.recurring_shift_id)
    .bind(requested_dates_json)
    .bind(payload.reason.trim())
    .bind(&payload.notes)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, cleaner_id, "Failed to create time-off request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Time-off request submitted",
        "status": "pending"
    })))
}

/* =========================
Approve time-off (Supervisor/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/time-off/{request_id}/approve",
    params(
        ("request_id" = u64, Path, description = "ID of the request to approve")
    ),
    responses(
        (status = 200, description = "Request approved", body = Object, example = json!({
            "message": "Time-off approved"
        })),
        (status = 400, description = "Request not found or already processed", body = Object, example = json!({
            "message": "Request not found or already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "TimeOff"
)]
pub async fn approve_time_off(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_supervisor_or_admin()?;

    let request_id = path.into_inner();

    let result = sqlx::query(
        r#"
        UPDATE time_off_requests
        SET status = 'approved', reviewed_by = ?, reviewed_at = NOW()
        WHERE id = ?
        AND status = 'pending'
        "#,
    )
    .bind(auth.user_id)
    .bind(request_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, request_id, "Approve time-off failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Request not found or already processed"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Time-off approved"
    })))
}

/* =========================
Decline time-off (Supervisor/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/time-off/{request_id}/decline",
    params(
        ("request_id" = u64, Path, description = "ID of the request to decline")
    ),
    request_body = DeclineTimeOff,
    responses(
        (status = 200, description = "Request declined", body = Object, example = json!({
            "message": "Time-off declined"
        })),
        (status = 400, description = "Request not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "TimeOff"
)]
pub async fn decline_time_off(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<DeclineTimeOff>,
) -> actix_web::Result<impl Responder> {
    auth.require_supervisor_or_admin()?;

    let request_id = path.into_inner();

    if payload.reason.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "decline reason must not be empty"
        })));
    }

    let result = sqlx::query(
        r#"
        UPDATE time_off_requests
        SET status = 'declined', reviewed_by = ?, reviewed_at = NOW(), decline_reason = ?
        WHERE id = ?
        AND status = 'pending'
        "#,
    )
    .bind(auth.user_id)
    .bind(payload.reason.trim())
    .bind(request_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, request_id, "Decline time-off failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Request not found or already processed"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Time-off declined"
    })))
}

/* =========================
Cancel time-off (owner, pending only)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/time-off/{request_id}/cancel",
    params(
        ("request_id" = u64, Path, description = "ID of the request to cancel")
    ),
    responses(
        (status = 200, description = "Request cancelled"),
        (status = 400, description = "Request not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "TimeOff"
)]
pub async fn cancel_time_off(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let cleaner_id = auth.require_cleaner_id()?;

    let request_id = path.into_inner();

    let result = sqlx::query(
        r#"
        UPDATE time_off_requests
        SET status = 'cancelled'
        WHERE id = ?
        AND cleaner_id = ?
        AND status = 'pending'
        "#,
    )
    .bind(request_id)
    .bind(cleaner_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, request_id, "Cancel time-off failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Request not found or already processed"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Time-off cancelled"
    })))
}

/// for getting one time-off request
#[utoipa::path(
    get,
    path = "/api/v1/time-off/{request_id}",
    params(
        ("request_id" = u64, Path, description = "ID of the request to fetch")
    ),
    responses(
        (status = 200, description = "Request found", body = TimeOffRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found", body = Object, example = json!({
            "message": "Request not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "TimeOff"
)]
pub async fn get_time_off(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_supervisor_or_admin()?;

    let request_id = path.into_inner();

    let request = sqlx::query_as::<_, TimeOffRequest>(&format!(
        "SELECT {} FROM time_off_requests WHERE id = ?",
        SELECT_COLUMNS
    ))
    .bind(request_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, request_id, "Failed to fetch time-off request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match request {
        Some(data) => Ok(HttpResponse::Ok().json(data)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Request not found"
        }))),
    }
}

/// for listing time-off requests
#[utoipa::path(
    get,
    path = "/api/v1/time-off",
    params(TimeOffFilter),
    responses(
        (status = 200, description = "Paginated time-off list", body = TimeOffListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "TimeOff"
)]
pub async fn time_off_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<TimeOffFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_supervisor_or_admin()?;

    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(cleaner_id) = query.cleaner_id {
        where_sql.push_str(" AND cleaner_id = ?");
        args.push(FilterValue::U64(cleaner_id));
    }

    if let Some(status) = query.status.as_deref() {
        if status.parse::<RequestStatus>().is_err() {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Invalid status. Allowed: pending, approved, declined, cancelled"
            })));
        }
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM time_off_requests{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error=%e, "Failed to count time-off requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        r#"
        SELECT {}
        FROM time_off_requests
        {}
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
        SELECT_COLUMNS, where_sql
    );

    let mut data_q = sqlx::query_as::<_, TimeOffRequest>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let requests = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error=%e, "Failed to fetch time-off list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    // -------------------------
    // Response
    // -------------------------
    let response = TimeOffListResponse {
        data: requests,
        page: page as u32,
        per_page: per_page as u32,
        total,
    };

    Ok(HttpResponse::Ok().json(response))
}

/// Is a cleaner free on a given date? Answers straight from a one-day
/// approved-requests window.
#[utoipa::path(
    get,
    path = "/api/v1/time-off/availability",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Availability verdict", body = AvailabilityResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 503, description = "Store unavailable; availability unknown")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "TimeOff"
)]
pub async fn check_availability(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AvailabilityQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_supervisor_or_admin()?;

    let cache = TimeOffCache::fetch_approved(pool.get_ref(), query.date, query.date)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch approved time-off");
            // never degrade to "available" when the store is unreachable
            actix_web::error::ErrorServiceUnavailable("Time-off store unavailable")
        })?;

    let request = resolve_time_off(
        &cache,
        query.cleaner_id,
        query.cleaner_name.as_deref(),
        query.date,
    )
    .cloned();

    Ok(HttpResponse::Ok().json(AvailabilityResponse {
        available: request.is_none(),
        request,
    }))
}

/// Id match first; legacy rows without a usable id are reachable only by
/// their snapshotted display name.
fn resolve_time_off<'a>(
    cache: &'a TimeOffCache,
    cleaner_id: u64,
    cleaner_name: Option<&str>,
    date: NaiveDate,
) -> Option<&'a TimeOffRequest> {
    cache
        .details_for(cleaner_id, date)
        .or_else(|| cleaner_name.and_then(|name| cache.details_for_name(name, date)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn payload(request_type: RequestType) -> CreateTimeOff {
        CreateTimeOff {
            request_type,
            shift_date: None,
            start_date: None,
            end_date: None,
            recurring_shift_id: None,
            requested_dates: None,
            reason: "vacation".to_string(),
            notes: None,
        }
    }

    #[test]
    fn single_shift_needs_exactly_its_own_shape() {
        let mut p = payload(RequestType::SingleShift);
        assert!(p.validate_shape().is_err());

        p.shift_date = Some(date("2024-03-05"));
        assert!(p.validate_shape().is_ok());

        p.start_date = Some(date("2024-03-05"));
        assert!(p.validate_shape().is_err());
    }

    #[test]
    fn date_range_rejects_inverted_bounds() {
        let mut p = payload(RequestType::DateRange);
        p.start_date = Some(date("2024-01-15"));
        p.end_date = Some(date("2024-01-10"));
        assert!(p.validate_shape().is_err());

        p.end_date = Some(date("2024-01-20"));
        assert!(p.validate_shape().is_ok());
    }

    fn approved_single_shift(id: u64, cleaner_id: u64, name: &str, day: &str) -> TimeOffRequest {
        TimeOffRequest {
            id,
            cleaner_id,
            cleaner_name: name.to_string(),
            request_type: "single_shift".to_string(),
            shift_date: Some(date(day)),
            start_date: None,
            end_date: None,
            recurring_shift_id: None,
            requested_dates: None,
            reason: "appointment".to_string(),
            notes: None,
            status: "approved".to_string(),
            reviewed_by: Some(1),
            reviewed_at: None,
            decline_reason: None,
            created_at: None,
        }
    }

    #[test]
    fn availability_falls_back_to_name_for_legacy_rows() {
        // legacy row: id 0 placeholder, only the snapshotted name is usable
        let cache = TimeOffCache::from_requests(
            date("2024-03-01"),
            date("2024-03-31"),
            vec![
                approved_single_shift(1, 7, "Jane Doe", "2024-03-05"),
                approved_single_shift(2, 0, "Amir Khan", "2024-03-05"),
            ],
        );
        let day = date("2024-03-05");

        // id match wins when present
        let hit = resolve_time_off(&cache, 7, Some("Jane Doe"), day).unwrap();
        assert_eq!(hit.id, 1);

        // no id match: the name reaches the legacy row
        let hit = resolve_time_off(&cache, 9, Some("Amir Khan"), day).unwrap();
        assert_eq!(hit.id, 2);

        // no id match and no name given: available
        assert!(resolve_time_off(&cache, 9, None, day).is_none());
    }

    #[test]
    fn recurring_needs_a_nonempty_date_list() {
        let mut p = payload(RequestType::RecurringInstances);
        assert!(p.validate_shape().is_err());

        p.requested_dates = Some(vec![]);
        assert!(p.validate_shape().is_err());

        p.requested_dates = Some(vec![date("2024-02-01"), date("2024-02-08")]);
        assert!(p.validate_shape().is_ok());
    }
}
