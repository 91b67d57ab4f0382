use std::collections::HashMap;

use crate::{
    auth::auth::AuthUser,
    error::ApiError,
    model::{
        attendance::{ATTENDANCE_COLUMNS, AttendanceStatus, AttendanceUserRow, AttendanceWithUser},
        role::Role,
    },
    utils::{
        clock::AttendanceClock,
        db_utils::qualify,
        stats::{
            DailyTrend, DashboardRange, MonthlyStat, average_clock_label, month_windows,
            monthly_stat, percentage, top_performers, weekly_trend,
        },
    },
};
use actix_web::{HttpResponse, web};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::debug;
use utoipa::ToSchema;

const TOP_PERFORMERS: usize = 5;
const RECENT_CHECK_INS: u64 = 5;
const MONTHS_SHOWN: u32 = 6;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub range: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentStat {
    #[schema(example = "Engineering")]
    pub name: String,
    pub count: i64,
    pub present_today: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopPerformer {
    pub name: String,
    pub department: String,
    #[schema(example = 95)]
    pub on_time_rate: i64,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_employees: i64,
    pub present_today: i64,
    pub absent_today: i64,
    pub late_today: i64,
    pub attendance_rate: i64,
    #[schema(example = "09:07")]
    pub avg_check_in: String,
    #[schema(example = "18:12")]
    pub avg_check_out: String,
    pub weekly_trend: Vec<DailyTrend>,
    pub departments: Vec<DepartmentStat>,
    pub top_performers: Vec<TopPerformer>,
    pub monthly_stats: Vec<MonthlyStat>,
    pub recent_attendance: Vec<AttendanceWithUser>,
}

#[derive(Debug, sqlx::FromRow)]
struct TodayRow {
    check_in_time: Option<DateTime<Utc>>,
    check_out_time: Option<DateTime<Utc>>,
    #[sqlx(try_from = "String")]
    status: AttendanceStatus,
    department: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct DayStatus {
    date: NaiveDate,
    #[sqlx(try_from = "String")]
    status: AttendanceStatus,
}

#[derive(Debug, PartialEq, Eq)]
struct TodaySummary {
    present: i64,
    late: i64,
    absent: i64,
    rate: i64,
    avg_check_in: String,
    avg_check_out: String,
}

fn summarize_today(rows: &[TodayRow], total_employees: i64, clock: &AttendanceClock) -> TodaySummary {
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

    let present = check_ins.len() as i64;
    let late = rows
        .iter()
        .filter(|r| r.status == AttendanceStatus::Late)
        .count() as i64;

    TodaySummary {
        present,
        late,
        absent: (total_employees - present).max(0),
        rate: percentage(present, total_employees),
        avg_check_in: average_clock_label(&check_ins),
        avg_check_out: average_clock_label(&check_outs),
    }
}

fn department_breakdown(groups: &[(Option<String>, i64)], today: &[TodayRow]) -> Vec<DepartmentStat> {
    groups
        .iter()
        .map(|(department, count)| DepartmentStat {
            name: department.clone().unwrap_or_else(|| "Unassigned".to_string()),
            count: *count,
            present_today: today
                .iter()
                .filter(|r| r.check_in_time.is_some() && &r.department == department)
                .count() as i64,
        })
        .collect()
}

fn monthly_breakdown(today: NaiveDate, rows: &[DayStatus], total_employees: i64) -> Vec<MonthlyStat> {
    month_windows(today, MONTHS_SHOWN)
        .into_iter()
        .map(|(start, end)| {
            let statuses: Vec<AttendanceStatus> = rows
                .iter()
                .filter(|r| r.date >= start && r.date <= end)
                .map(|r| r.status)
                .collect();
            monthly_stat(start, &statuses, total_employees)
        })
        .collect()
}

async fn load_top_performers(
    pool: &MySqlPool,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<TopPerformer>, sqlx::Error> {
    let counts = sqlx::query_as::<_, (u64, i64, i64)>(
        r#"
        SELECT user_id, COUNT(*), CAST(SUM(status = 'ON_TIME') AS SIGNED)
        FROM attendance
        WHERE date BETWEEN ? AND ?
        GROUP BY user_id
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    let ranked = top_performers(&counts, TOP_PERFORMERS);
    if ranked.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; ranked.len()].join(", ");
    let sql = format!("SELECT id, name, department FROM users WHERE id IN ({placeholders})");
    let mut query = sqlx::query_as::<_, (u64, String, Option<String>)>(&sql);
    for performer in &ranked {
        query = query.bind(performer.user_id);
    }
    let users: HashMap<u64, (String, Option<String>)> = query
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(|(id, name, department)| (id, (name, department)))
        .collect();

    Ok(ranked
        .into_iter()
        .map(|p| {
            let (name, department) = users
                .get(&p.user_id)
                .cloned()
                .unwrap_or_else(|| ("Unknown".to_string(), None));
            TopPerformer {
                name,
                department: department.unwrap_or_else(|| "No Department".to_string()),
                on_time_rate: p.rate,
            }
        })
        .collect())
}

#[utoipa::path(
    get,
    path = "/api/dashboard",
    params(
        ("range", Query, description = "week | month | quarter (default month)")
    ),
    responses(
        (status = 200, description = "Aggregated attendance statistics", body = DashboardStats),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Dashboard",
    security(
        ("cookie_auth" = []),
        ("bearer_auth" = [])
    )
)]
pub async fn dashboard(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<AttendanceClock>,
    query: web::Query<DashboardQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let pool = pool.get_ref();
    let today = clock.today();
    let range = DashboardRange::parse(query.range.as_deref());
    let employee = Role::Employee.to_string();

    debug!(%today, ?range, "Building dashboard");

    let total_employees = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users WHERE role = ? AND is_active = TRUE",
    )
    .bind(&employee)
    .fetch_one(pool)
    .await?;

    let today_rows = sqlx::query_as::<_, TodayRow>(
        r#"
        SELECT a.check_in_time, a.check_out_time, a.status, u.department
        FROM attendance a
        JOIN users u ON u.id = a.user_id
        WHERE a.date = ?
        "#,
    )
    .bind(today)
    .fetch_all(pool)
    .await?;

    let summary = summarize_today(&today_rows, total_employees, &clock);

    let week_start = today - Duration::days(6);
    let week_rows = sqlx::query_as::<_, DayStatus>(
        "SELECT date, status FROM attendance WHERE date BETWEEN ? AND ?",
    )
    .bind(week_start)
    .bind(today)
    .fetch_all(pool)
    .await?;
    let week: Vec<(NaiveDate, AttendanceStatus)> =
        week_rows.iter().map(|r| (r.date, r.status)).collect();

    let groups = sqlx::query_as::<_, (Option<String>, i64)>(
        r#"
        SELECT department, COUNT(*)
        FROM users
        WHERE role = ? AND is_active = TRUE
        GROUP BY department
        "#,
    )
    .bind(&employee)
    .fetch_all(pool)
    .await?;

    let top = load_top_performers(pool, range.start(today), today).await?;

    let windows = month_windows(today, MONTHS_SHOWN);
    let months_from = windows.first().map(|(start, _)| *start).unwrap_or(today);
    let month_rows = sqlx::query_as::<_, DayStatus>(
        "SELECT date, status FROM attendance WHERE date BETWEEN ? AND ?",
    )
    .bind(months_from)
    .bind(today)
    .fetch_all(pool)
    .await?;

    let recent = sqlx::query_as::<_, AttendanceUserRow>(&format!(
        r#"
        SELECT {}, u.name AS user_name, u.email AS user_email,
               u.department AS user_department, u.position AS user_position
        FROM attendance a
        JOIN users u ON u.id = a.user_id
        WHERE a.date = ? AND a.check_in_time IS NOT NULL
        ORDER BY a.check_in_time DESC
        LIMIT ?
        "#,
        qualify(ATTENDANCE_COLUMNS, "a")
    ))
    .bind(today)
    .bind(RECENT_CHECK_INS)
    .fetch_all(pool)
    .await?;

    Ok(HttpResponse::Ok().json(DashboardStats {
        total_employees,
        present_today: summary.present,
        absent_today: summary.absent,
        late_today: summary.late,
        attendance_rate: summary.rate,
        avg_check_in: summary.avg_check_in,
        avg_check_out: summary.avg_check_out,
        weekly_trend: weekly_trend(today, &week),
        departments: department_breakdown(&groups, &today_rows),
        top_performers: top,
        monthly_stats: monthly_breakdown(today, &month_rows, total_employees),
        recent_attendance: recent.into_iter().map(Into::into).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(check_in: Option<(u32, u32)>, check_out: Option<(u32, u32)>, status: AttendanceStatus, dept: Option<&str>) -> TodayRow {
        let utc = |(h, m): (u32, u32)| Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap();
        TodayRow {
            check_in_time: check_in.map(utc),
            check_out_time: check_out.map(utc),
            status,
            department: dept.map(str::to_string),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn today_summary_counts_and_averages() {
        let rows = vec![
            row(Some((3, 25)), Some((12, 30)), AttendanceStatus::OnTime, Some("Sales")),
            row(Some((4, 0)), None, AttendanceStatus::Late, None),
        ];

        let summary = summarize_today(&rows, 4, &AttendanceClock::ist());
        assert_eq!(
            summary,
            TodaySummary {
                present: 2,
                late: 1,
                absent: 2,
                rate: 50,
                // 08:55 and 09:30 IST
                avg_check_in: "09:13".to_string(),
                avg_check_out: "18:00".to_string(),
            }
        );
    }

    #[test]
    fn no_employees_means_zero_rate() {
        let summary = summarize_today(&[], 0, &AttendanceClock::ist());
        assert_eq!(summary.rate, 0);
        assert_eq!(summary.absent, 0);
        assert_eq!(summary.avg_check_in, "--:--");
    }

    #[test]
    fn departments_label_missing_names_and_count_presence() {
        let groups = vec![(Some("Sales".to_string()), 3), (None, 2)];
        let today = vec![
            row(Some((3, 0)), None, AttendanceStatus::OnTime, Some("Sales")),
            row(None, None, AttendanceStatus::Absent, Some("Sales")),
            row(Some((3, 0)), None, AttendanceStatus::OnTime, None),
        ];

        assert_eq!(
            department_breakdown(&groups, &today),
            vec![
                DepartmentStat {
                    name: "Sales".into(),
                    count: 3,
                    present_today: 1
                },
                DepartmentStat {
                    name: "Unassigned".into(),
                    count: 2,
                    present_today: 1
                },
            ]
        );
    }

    #[test]
    fn monthly_breakdown_buckets_by_calendar_month() {
        let rows = vec![
            DayStatus {
                date: day(2026, 3, 1),
                status: AttendanceStatus::OnTime,
            },
            DayStatus {
                date: day(2026, 3, 2),
                status: AttendanceStatus::Late,
            },
            DayStatus {
                date: day(2026, 2, 27),
                status: AttendanceStatus::Late,
            },
        ];

        let stats = monthly_breakdown(day(2026, 3, 15), &rows, 4);
        assert_eq!(stats.len(), 6);
        assert_eq!(stats[0].month, "Oct 2025");
        assert_eq!(stats[0].avg_attendance, 0);

        let feb = &stats[4];
        assert_eq!(feb.month, "Feb 2026");
        assert_eq!((feb.avg_attendance, feb.avg_late), (25, 100));

        let mar = &stats[5];
        assert_eq!((mar.avg_attendance, mar.avg_late), (50, 50));
    }
}
