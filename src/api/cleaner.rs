use crate::{
    auth::auth::AuthUser,
    model::cleaner::Cleaner,
    utils::db_utils::{build_update_sql, execute_update},
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::ToSchema;

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateCleaner {
    #[schema(example = "CLN-042", value_type = String)]
    pub cleaner_code: String,
    #[schema(example = "Jane", value_type = String)]
    pub first_name: String,
    #[schema(example = "Doe", value_type = String)]
    pub last_name: String,
    #[schema(example = "jane@cleanco.com", format = "email", value_type = String)]
    pub email: String,
    #[schema(example = "+15550100", nullable = true)]
    pub phone: Option<String>,
    #[schema(example = 22.5)]
    pub hourly_rate: f64,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub hire_date: chrono::NaiveDate,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CleanerQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CleanerListResponse {
    pub data: Vec<Cleaner>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 10)]
    pub total: i64,
}

const UPDATABLE_COLUMNS: &[&str] = &[
    "cleaner_code",
    "first_name",
    "last_name",
    "email",
    "phone",
    "hourly_rate",
    "hire_date",
    "status",
];

/// Create Cleaner
#[utoipa::path(
    post,
    path = "/api/v1/cleaners",
    request_body = CreateCleaner,
    responses(
        (status = 200, description = "Cleaner created", body = Object, example = json!({
            "message": "Cleaner created"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Cleaner",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_cleaner(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateCleaner>,
) -> actix_web::Result<impl Responder> {
    auth.require_supervisor_or_admin()?;

    let result = sqlx::query(
        r#"
        INSERT INTO cleaners
        (cleaner_code, first_name, last_name, email, phone, hourly_rate, hire_date, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, 'active')
        "#,
    )
    .bind(&payload.cleaner_code)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(payload.hourly_rate)
    .bind(payload.hire_date)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => Ok(HttpResponse::Ok().json(json!({
            "message": "Cleaner created"
        }))),
        Err(e) => {
            error!(error = %e, "Failed to create cleaner");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Something went wrong, Contact with system admin"
            })))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/cleaners",
    params(
        ("page", Query, description = "Page number"),
        ("per_page", Query, description = "Items per page"),
        ("status", Query, description = "Filter by status"),
        ("search", Query, description = "Search by name or email")
    ),
    responses(
        (status = 200, description = "Paginated cleaner list", body = CleanerListResponse)
    ),
    tag = "Cleaner",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_cleaners(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<CleanerQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_supervisor_or_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(status) = &query.status {
        conditions.push("status = ?");
        bindings.push(status.clone());
    }

    if let Some(search) = &query.search {
        conditions.push("(first_name LIKE ? OR last_name LIKE ? OR email LIKE ?)");
        let like = format!("%{}%", search);
        bindings.push(like.clone());
        bindings.push(like.clone());
        bindings.push(like);
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) as total FROM cleaners {}", where_clause);
    debug!(sql = %count_sql, bindings = ?bindings, "Counting cleaners");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count cleaners");
        ErrorInternalServerError("Database error")
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT * FROM cleaners {} ORDER BY id DESC LIMIT ? OFFSET ?",
        where_clause
    );
    debug!(sql = %data_sql, bindings = ?bindings, page, per_page, offset, "Fetching cleaners");

    let mut data_query = sqlx::query_as::<_, Cleaner>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    data_query = data_query.bind(per_page as i64).bind(offset as i64);

    let cleaners = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %data_sql, "Failed to fetch cleaners");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(CleanerListResponse {
        data: cleaners,
        page,
        per_page,
        total,
    }))
}

/// Update Cleaner
#[utoipa::path(
    put,
    path = "/api/v1/cleaners/{cleaner_id}",
    params(
        ("cleaner_id", Path, description = "Cleaner ID")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Cleaner updated"),
        (status = 400, description = "Unknown field in payload"),
        (status = 404, description = "Cleaner not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Cleaner",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_cleaner(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_supervisor_or_admin()?;

    let cleaner_id = path.into_inner();

    let update = build_update_sql("cleaners", &body, UPDATABLE_COLUMNS, "id", cleaner_id)?;

    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().body("Cleaner not found"));
    }

    Ok(HttpResponse::Ok().body("Cleaner updated successfully"))
}

/// Delete Cleaner
#[utoipa::path(
    delete,
    path = "/api/v1/cleaners/{cleaner_id}",
    params(
        ("cleaner_id", Path, description = "Cleaner ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Cleaner not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Cleaner",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_cleaner(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let cleaner_id = path.into_inner();

    let result = sqlx::query("DELETE FROM cleaners WHERE id = ?")
        .bind(cleaner_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(res) => {
            if res.rows_affected() == 0 {
                return Ok(HttpResponse::NotFound().json(json!({
                    "message": "Cleaner not found"
                })));
            }

            Ok(HttpResponse::Ok().json(json!({
                "message": "Successfully deleted"
            })))
        }

        Err(e) => {
            error!(error = %e, cleaner_id, "Failed to delete cleaner");

            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

/// Get Cleaner by ID
#[utoipa::path(
    get,
    path = "/api/v1/cleaners/{cleaner_id}",
    params(
        ("cleaner_id", Path, description = "Cleaner ID")
    ),
    responses(
        (status = 200, description = "Cleaner found", body = Cleaner),
        (status = 404, description = "Cleaner not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Cleaner",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_cleaner(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_supervisor_or_admin()?;

    let cleaner_id: u64 = path.into_inner();

    let cleaner = sqlx::query_as::<_, Cleaner>(
        r#"
        SELECT
            id, cleaner_code, first_name, last_name, email,
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
    })?;

    match cleaner {
        Some(c) => Ok(HttpResponse::Ok().json(c)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Cleaner not found"
        }))),
    }
}
