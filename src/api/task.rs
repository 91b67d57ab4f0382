use crate::{
    api::{Pagination, Paging},
    auth::auth::AuthUser,
    error::ApiError,
    model::task::{Task, TaskPriority, TaskStatus, TaskUserRow, TaskWithUser},
    utils::{
        db_utils::{BindSqlValue, SqlFilter, SqlValue, build_update_sql, execute_update, qualify},
        validation,
    },
};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, info};
use utoipa::ToSchema;

const TASK_COLUMNS: &str =
    "id, title, description, assigned_to, due_date, priority, status, created_at, updated_at";

const JOINED_USER_COLUMNS: &str = "u.name AS user_name, u.email AS user_email, \
    u.department AS user_department, u.position AS user_position";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
    pub assigned_to: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    #[schema(example = "Prepare monthly report")]
    pub title: String,
    #[schema(nullable = true)]
    pub description: Option<String>,
    #[schema(example = 2)]
    pub assigned_to: u64,
    #[schema(example = "2026-02-01", nullable = true)]
    pub due_date: Option<String>,
    #[schema(example = "medium", nullable = true)]
    pub priority: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(example = "2026-02-01")]
    pub due_date: Option<String>,
    #[schema(example = "high")]
    pub priority: Option<String>,
    #[schema(example = "in_progress")]
    pub status: Option<String>,
}

impl UpdateTask {
    fn touches_more_than_status(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.due_date.is_some()
            || self.priority.is_some()
    }

    fn changes(&self) -> Result<Vec<(&'static str, SqlValue)>, ApiError> {
        let mut changes = Vec::new();

        if let Some(title) = &self.title {
            validation::min_chars(title.trim(), 1, "Title is required")?;
            changes.push(("title", title.trim().into()));
        }
        if let Some(description) = &self.description {
            changes.push(("description", description.as_str().into()));
        }
        if let Some(due) = self.due_date.as_deref() {
            let due = Some(due.trim())
                .filter(|d| !d.is_empty())
                .map(validation::due_date)
                .transpose()?;
            changes.push(("due_date", due.into()));
        }
        if let Some(priority) = self.priority.as_deref() {
            let priority: TaskPriority = validation::one_of("priority", priority)?;
            changes.push(("priority", priority.to_string().into()));
        }
        if let Some(status) = self.status.as_deref() {
            let status: TaskStatus = validation::one_of("status", status)?;
            changes.push(("status", status.to_string().into()));
        }

        Ok(changes)
    }
}

#[derive(Serialize, ToSchema)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskWithUser>,
    pub pagination: Pagination,
}

async fn find_task(pool: &MySqlPool, id: u64) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

async fn find_task_with_user(pool: &MySqlPool, id: u64) -> Result<Option<TaskWithUser>, sqlx::Error> {
    let row = sqlx::query_as::<_, TaskUserRow>(&format!(
        "SELECT {}, {JOINED_USER_COLUMNS} FROM tasks t JOIN users u ON u.id = t.assigned_to \
         WHERE t.id = ?",
        qualify(TASK_COLUMNS, "t")
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Into::into))
}

fn task_filter(auth: &AuthUser, query: &TaskQuery) -> Result<SqlFilter, ApiError> {
    let mut filter = SqlFilter::new();

    if auth.is_employee() {
        filter.eq("t.assigned_to", auth.user_id);
    } else if let Some(assignee) = query.assigned_to {
        filter.eq("t.assigned_to", assignee);
    }

    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        let status: TaskStatus = validation::one_of("status", status)?;
        filter.eq("t.status", status.to_string());
    }

    Ok(filter)
}

#[utoipa::path(
    get,
    path = "/api/tasks",
    params(
        ("page", Query, description = "Page number (default 1)"),
        ("limit", Query, description = "Items per page (default 10, max 100)"),
        ("status", Query, description = "pending | in_progress | completed"),
        ("assignedTo", Query, description = "Assignee user id (admins only)")
    ),
    responses(
        (status = 200, description = "Paginated tasks, newest first", body = TaskListResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Task",
    security(
        ("cookie_auth" = []),
        ("bearer_auth" = [])
    )
)]
pub async fn list_tasks(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<TaskQuery>,
) -> Result<HttpResponse, ApiError> {
    let paging = Paging::new(query.page, query.limit);
    let filter = task_filter(&auth, &query)?;

    let count_sql = format!("SELECT COUNT(*) FROM tasks t {}", filter.where_clause());
    let total = sqlx::query_scalar::<_, i64>(&count_sql)
        .bind_all(filter.values())
        .fetch_one(pool.get_ref())
        .await?;

    let data_sql = format!(
        "SELECT {}, {JOINED_USER_COLUMNS} FROM tasks t JOIN users u ON u.id = t.assigned_to {} \
         ORDER BY t.created_at DESC, t.id DESC LIMIT ? OFFSET ?",
        qualify(TASK_COLUMNS, "t"),
        filter.where_clause()
    );
    debug!(sql = %data_sql, page = paging.page, limit = paging.limit, "Fetching tasks");

    let rows = sqlx::query_as::<_, TaskUserRow>(&data_sql)
        .bind_all(filter.values())
        .bind(paging.limit as u64)
        .bind(paging.offset())
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(TaskListResponse {
        tasks: rows.into_iter().map(Into::into).collect(),
        pagination: Pagination::new(paging, total),
    }))
}

#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = CreateTask,
    responses(
        (status = 201, description = "Task created", body = TaskWithUser),
        (status = 400, description = "Validation failed or unknown assignee"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Task",
    security(
        ("cookie_auth" = []),
        ("bearer_auth" = [])
    )
)]
pub async fn create_task(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<CreateTask>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let title = body.title.trim();
    validation::min_chars(title, 1, "Title is required")?;

    let priority: TaskPriority = match body.priority.as_deref() {
        Some(p) => validation::one_of("priority", p)?,
        None => TaskPriority::default(),
    };
    let due_date = body
        .due_date
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(validation::due_date)
        .transpose()?;

    let assignee_exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
            .bind(body.assigned_to)
            .fetch_one(pool.get_ref())
            .await?;
    if !assignee_exists {
        return Err(ApiError::bad_request("Assignee not found"));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO tasks (title, description, assigned_to, due_date, priority, status)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(title)
    .bind(body.description.as_deref())
    .bind(body.assigned_to)
    .bind(due_date)
    .bind(priority.to_string())
    .bind(TaskStatus::default().to_string())
    .execute(pool.get_ref())
    .await?;

    let id = result.last_insert_id();
    let task = find_task_with_user(pool.get_ref(), id)
        .await?
        .ok_or(ApiError::Internal)?;

    info!(admin_id = auth.user_id, task_id = id, assignee = body.assigned_to, "Task created");

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "data": task
    })))
}

#[utoipa::path(
    patch,
    path = "/api/tasks/{id}",
    params(
        ("id", Path, description = "Task ID")
    ),
    request_body = UpdateTask,
    responses(
        (status = 200, description = "Task updated", body = TaskWithUser),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden / Only status can be updated"),
        (status = 404, description = "Task not found")
    ),
    tag = "Task",
    security(
        ("cookie_auth" = []),
        ("bearer_auth" = [])
    )
)]
pub async fn update_task(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateTask>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let changes = body.changes()?;

    let task = find_task(pool.get_ref(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;

    if auth.is_employee() {
        if task.assigned_to != auth.user_id {
            return Err(ApiError::forbidden());
        }
        if body.touches_more_than_status() {
            return Err(ApiError::Forbidden("Only status can be updated".to_string()));
        }
    }

    if let Some(update) = build_update_sql("tasks", changes, "id", id) {
        execute_update(pool.get_ref(), update).await?;
        info!(user_id = auth.user_id, task_id = id, "Task updated");
    }

    let task = find_task_with_user(pool.get_ref(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": task
    })))
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    params(
        ("id", Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task deleted", body = Object, example = json!({
            "success": true,
            "message": "Task deleted successfully"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Task not found")
    ),
    tag = "Task",
    security(
        ("cookie_auth" = []),
        ("bearer_auth" = [])
    )
)]
pub async fn delete_task(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let id = path.into_inner();
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Task not found"));
    }

    info!(admin_id = auth.user_id, task_id = id, "Task deleted");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Task deleted successfully"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;

    fn auth(role: Role) -> AuthUser {
        AuthUser {
            user_id: 4,
            email: "worker@company.com".into(),
            role,
        }
    }

    #[test]
    fn employees_only_list_their_own_tasks() {
        let query = TaskQuery {
            assigned_to: Some(9),
            status: Some("completed".into()),
            ..Default::default()
        };

        let filter = task_filter(&auth(Role::Employee), &query).unwrap();
        assert_eq!(filter.where_clause(), "WHERE t.assigned_to = ? AND t.status = ?");
        assert_eq!(filter.values()[0], SqlValue::U64(4));

        let filter = task_filter(&auth(Role::Admin), &query).unwrap();
        assert_eq!(filter.values()[0], SqlValue::U64(9));
    }

    #[test]
    fn status_only_updates_are_recognised() {
        let status_only = UpdateTask {
            status: Some("in_progress".into()),
            ..Default::default()
        };
        assert!(!status_only.touches_more_than_status());
        assert_eq!(
            status_only.changes().unwrap(),
            vec![("status", SqlValue::from("in_progress"))]
        );

        let more = UpdateTask {
            title: Some("New title".into()),
            status: Some("completed".into()),
            ..Default::default()
        };
        assert!(more.touches_more_than_status());
    }

    #[test]
    fn update_validates_enums_and_dates() {
        let bad_priority = UpdateTask {
            priority: Some("urgent".into()),
            ..Default::default()
        };
        assert_eq!(
            bad_priority.changes().unwrap_err().to_string(),
            "Invalid priority. Allowed: low, medium, high"
        );

        let cleared = UpdateTask {
            due_date: Some("".into()),
            ..Default::default()
        };
        assert_eq!(cleared.changes().unwrap(), vec![("due_date", SqlValue::Null)]);

        let blank_title = UpdateTask {
            title: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(blank_title.changes().unwrap_err().to_string(), "Title is required");
    }
}
