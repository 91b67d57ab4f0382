use crate::{
    api::Paging,
    auth::{auth::AuthUser, password::hash_password},
    error::ApiError,
    model::{
        role::Role,
        user::{USER_COLUMNS, User},
    },
    utils::{
        clock::AttendanceClock,
        db_utils::{
            BindSqlValue, SqlFilter, SqlValue, build_update_sql, execute_update, is_duplicate_key,
            like_pattern,
        },
        stats::average_clock_label,
        validation::{self, normalize_email},
    },
};
use actix_web::{HttpResponse, web};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, info};
use utoipa::ToSchema;

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "john@company.com", format = "email", value_type = String)]
    pub email: String,
    #[schema(example = "secret123", value_type = String)]
    pub password: String,
    #[schema(example = "John Doe", value_type = String)]
    pub name: String,
    #[schema(example = "+919876543210", nullable = true)]
    pub phone: Option<String>,
    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,
    #[schema(example = "Developer", nullable = true)]
    pub position: Option<String>,
}

impl CreateEmployee {
    fn validate(&self) -> Result<(), ApiError> {
        validation::email(&self.email)?;
        validation::password(&self.password)?;
        validation::name(&self.name)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployee {
    #[schema(example = "Jane Doe")]
    pub name: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateEmployee {
    /// Validated column changes; empty optional text clears the column
    fn changes(&self) -> Result<Vec<(&'static str, SqlValue)>, ApiError> {
        let mut changes = Vec::new();

        if let Some(name) = &self.name {
            validation::name(name)?;
            changes.push(("name", name.trim().into()));
        }

        for (column, value) in [
            ("phone", &self.phone),
            ("department", &self.department),
            ("position", &self.position),
        ] {
            if let Some(value) = value {
                changes.push((column, optional_text(value)));
            }
        }

        if let Some(active) = self.is_active {
            changes.push(("is_active", active.into()));
        }

        Ok(changes)
    }
}

fn optional_text(value: &str) -> SqlValue {
    Some(value.trim())
        .filter(|v| !v.is_empty())
        .map(SqlValue::from)
        .unwrap_or(SqlValue::Null)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeePagination {
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub limit: u32,
    #[schema(example = 42)]
    pub total: i64,
    #[schema(example = 5)]
    pub pages: i64,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub employees: Vec<User>,
    pub pagination: EmployeePagination,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeStats {
    #[schema(example = 120)]
    pub total_attendance: i64,
    #[schema(example = 8.75)]
    pub avg_work_hours: f64,
    #[schema(example = "09:12")]
    pub avg_check_in: String,
    #[schema(example = "18:05")]
    pub avg_check_out: String,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeDetail {
    #[serde(flatten)]
    pub user: User,
    pub stats: EmployeeStats,
}

#[derive(Debug, sqlx::FromRow)]
struct AttendanceTimes {
    check_in_time: Option<DateTime<Utc>>,
    check_out_time: Option<DateTime<Utc>>,
    work_hours: Option<f64>,
}

fn employee_stats(rows: &[AttendanceTimes], clock: &AttendanceClock) -> EmployeeStats {
    let hours: Vec<f64> = rows.iter().filter_map(|r| r.work_hours).collect();
    let avg_work_hours = if hours.is_empty() {
        0.0
    } else {
        hours.iter().sum::<f64>() / hours.len() as f64
    };

    let check_ins: Vec<u32> = rows
        .iter()
        .filter_map(|r| r.check_in_time)
        .map(|at| clock.minutes_of_day(at))
        .collect();
    let check_outs: Vec<u32> = rows
        .iter()
        .filter_map(|r| r.check_out_time)
        .map(|at| clock.minutes_of_day(at))
        .collect();

    EmployeeStats {
        total_attendance: rows.len() as i64,
        avg_work_hours,
        avg_check_in: average_clock_label(&check_ins),
        avg_check_out: average_clock_label(&check_outs),
    }
}

pub(crate) async fn find_user(pool: &MySqlPool, id: u64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

async fn email_taken(pool: &MySqlPool, email: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = ? LIMIT 1)")
        .bind(email)
        .fetch_one(pool)
        .await
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = User),
        (status = 400, description = "Validation failed or email already registered", body = Object, example = json!({
            "success": false,
            "error": "Email already registered"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("cookie_auth" = []),
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;
    payload.validate()?;

    let email = normalize_email(&payload.email);

    // The unique key still catches a concurrent registration below
    if email_taken(pool.get_ref(), &email).await? {
        return Err(ApiError::bad_request("Email already registered"));
    }

    let hashed = hash_password(&payload.password)?;

    let result = sqlx::query(
        r#"
        INSERT INTO users (email, password, name, role, phone, department, position)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&email)
    .bind(&hashed)
    .bind(payload.name.trim())
    .bind(Role::Employee.to_string())
    .bind_value(optional_text(payload.phone.as_deref().unwrap_or_default()))
    .bind_value(optional_text(payload.department.as_deref().unwrap_or_default()))
    .bind_value(optional_text(payload.position.as_deref().unwrap_or_default()))
    .execute(pool.get_ref())
    .await;

    let id = match result {
        Ok(done) => done.last_insert_id(),
        Err(e) if is_duplicate_key(&e) => {
            return Err(ApiError::bad_request("Email already registered"));
        }
        Err(e) => return Err(e.into()),
    };

    let employee = find_user(pool.get_ref(), id)
        .await?
        .ok_or(ApiError::Internal)?;

    info!(admin_id = auth.user_id, employee_id = id, "Employee created");

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "data": employee
    })))
}

#[utoipa::path(
    get,
    path = "/api/employees",
    params(
        ("page", Query, description = "Page number (default 1)"),
        ("limit", Query, description = "Items per page (default 10, max 100)"),
        ("search", Query, description = "Search by name or email"),
        ("department", Query, description = "Filter by department")
    ),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Employee",
    security(
        ("cookie_auth" = []),
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let paging = Paging::new(query.page, query.limit);

    let mut filter = SqlFilter::new();
    filter.eq("role", Role::Employee.to_string());

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let like = like_pattern(search);
        filter.push("(name LIKE ? OR email LIKE ?)", vec![like.clone().into(), like.into()]);
    }

    if let Some(department) = query.department.as_deref().filter(|d| !d.is_empty()) {
        filter.eq("department", department);
    }

    let count_sql = format!("SELECT COUNT(*) FROM users {}", filter.where_clause());
    let total = sqlx::query_scalar::<_, i64>(&count_sql)
        .bind_all(filter.values())
        .fetch_one(pool.get_ref())
        .await?;

    let data_sql = format!(
        "SELECT {USER_COLUMNS} FROM users {} ORDER BY name ASC LIMIT ? OFFSET ?",
        filter.where_clause()
    );
    debug!(sql = %data_sql, page = paging.page, limit = paging.limit, "Fetching employees");

    let employees = sqlx::query_as::<_, User>(&data_sql)
        .bind_all(filter.values())
        .bind(paging.limit as u64)
        .bind(paging.offset())
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        employees,
        pagination: EmployeePagination {
            page: paging.page,
            limit: paging.limit,
            total,
            pages: paging.total_pages(total),
        },
    }))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    params(
        ("id", Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Employee profile with this year's attendance stats", body = EmployeeDetail),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "success": false,
            "error": "Employee not found"
        }))
    ),
    tag = "Employee",
    security(
        ("cookie_auth" = []),
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<AttendanceClock>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    auth.require_self_or_admin(id)?;

    let user = find_user(pool.get_ref(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    let today = clock.today();
    let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);

    let rows = sqlx::query_as::<_, AttendanceTimes>(
        r#"
        SELECT check_in_time, check_out_time, work_hours
        FROM attendance
        WHERE user_id = ? AND date >= ?
        "#,
    )
    .bind(id)
    .bind(year_start)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": EmployeeDetail {
            user,
            stats: employee_stats(&rows, &clock),
        }
    })))
}

/// Update Employee
#[utoipa::path(
    patch,
    path = "/api/employees/{id}",
    params(
        ("id", Path, description = "User ID")
    ),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Employee updated", body = User),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("cookie_auth" = []),
        ("bearer_auth" = [])
    )
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateEmployee>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let id = path.into_inner();
    let changes = body.changes()?;

    if find_user(pool.get_ref(), id).await?.is_none() {
        return Err(ApiError::not_found("Employee not found"));
    }

    if let Some(update) = build_update_sql("users", changes, "id", id) {
        execute_update(pool.get_ref(), update).await?;
        info!(admin_id = auth.user_id, employee_id = id, "Employee updated");
    }

    let employee = find_user(pool.get_ref(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": employee
    })))
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    params(
        ("id", Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "success": true,
            "message": "Employee deleted successfully"
        })),
        (status = 400, description = "Cannot delete your own account"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("cookie_auth" = []),
        ("bearer_auth" = [])
    )
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let id = path.into_inner();
    if id == auth.user_id {
        return Err(ApiError::bad_request("You cannot delete your own account"));
    }

    if find_user(pool.get_ref(), id).await?.is_none() {
        return Err(ApiError::not_found("Employee not found"));
    }

    // attendance and tasks go with the user (ON DELETE CASCADE)
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    info!(admin_id = auth.user_id, employee_id = id, "Employee deleted");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Employee deleted successfully"
    })))
}
