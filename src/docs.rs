use crate::api::Pagination;
use crate::api::attendance::{AttendanceListResponse, LocationPayload, TodayStatus};
use crate::api::dashboard::{DashboardStats, DepartmentStat, TopPerformer};
use crate::api::employee::{
    CreateEmployee, EmployeeDetail, EmployeeListResponse, EmployeePagination, EmployeeStats,
    UpdateEmployee,
};
use crate::api::settings::{SettingUpdate, UpdateSettings};
use crate::api::task::{CreateTask, TaskListResponse, UpdateTask};
use crate::auth::session::COOKIE_NAME;
use crate::model::attendance::{Attendance, AttendanceStatus, AttendanceWithUser};
use crate::model::role::Role;
use crate::model::setting::Setting;
use crate::model::task::{Task, TaskPriority, TaskStatus, TaskWithUser};
use crate::model::user::{User, UserSummary};
use crate::models::{LoginReqDto, SessionUser};
use crate::utils::stats::{DailyTrend, MonthlyStat};
use utoipa::openapi::security::{
    ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme,
};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Tracker API",
        version = "1.0.0",
        description = r#"
## Employee Attendance & Task Tracking

Employees check in and out with their location once per day; admins manage
employees, tasks and company settings and follow attendance on a dashboard.

### Key Features
- **Attendance**
  - Geo-tagged check-in / check-out, ON_TIME / LATE derived from company settings
  - Filterable history and CSV export
- **Employees**
  - Create, update, deactivate and delete employee accounts
- **Tasks**
  - Assign tasks; employees move their own tasks through pending / in_progress / completed
- **Dashboard**
  - Today's presence, weekly trend, departments, top performers, monthly stats

### Security
Sessions are HS256 JWTs carried in the HTTP-only `auth_token` cookie set by
`POST /api/auth/login`. API clients may send the same token as a Bearer header.

### Response Format
- Success: `{"success": true, "data": ..., "message"?: ...}`
- Failure: `{"success": false, "error": "..."}`
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::logout,
        crate::auth::handlers::me,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::today_status,
        crate::api::attendance::list_attendance,
        crate::api::attendance::export_attendance_csv,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::task::list_tasks,
        crate::api::task::create_task,
        crate::api::task::update_task,
        crate::api::task::delete_task,

        crate::api::settings::get_settings,
        crate::api::settings::update_settings,

        crate::api::dashboard::dashboard
    ),
    components(
        schemas(
            LoginReqDto,
            SessionUser,
            Role,
            User,
            UserSummary,
            Attendance,
            AttendanceStatus,
            AttendanceWithUser,
            AttendanceListResponse,
            LocationPayload,
            TodayStatus,
            Pagination,
            CreateEmployee,
            UpdateEmployee,
            EmployeeDetail,
            EmployeeStats,
            EmployeeListResponse,
            EmployeePagination,
            Task,
            TaskPriority,
            TaskStatus,
            TaskWithUser,
            TaskListResponse,
            CreateTask,
            UpdateTask,
            Setting,
            SettingUpdate,
            UpdateSettings,
            DashboardStats,
            DepartmentStat,
            TopPerformer,
            DailyTrend,
            MonthlyStat
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Session login / logout"),
        (name = "Attendance", description = "Check-in, check-out and attendance history"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Task", description = "Task assignment and progress"),
        (name = "Settings", description = "Company-wide settings"),
        (name = "Dashboard", description = "Admin analytics"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(COOKIE_NAME))),
            );
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_routes_and_security() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/attendance/check-in"));
        assert!(doc.paths.paths.contains_key("/api/employees/{id}"));

        let schemes = &doc.components.as_ref().unwrap().security_schemes;
        assert!(schemes.contains_key("cookie_auth"));
        assert!(schemes.contains_key("bearer_auth"));
    }
}
