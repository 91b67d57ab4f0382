use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::AttendanceStatus;

pub const NO_TIME: &str = "--:--";

/// Mean of minutes-of-day values formatted as `HH:MM`, or `--:--` when empty
pub fn average_clock_label(minutes: &[u32]) -> String {
    if minutes.is_empty() {
        return NO_TIME.to_string();
    }
    let sum: u64 = minutes.iter().map(|m| *m as u64).sum();
    let avg = (sum as f64 / minutes.len() as f64).round() as u64;
    format!("{:02}:{:02}", avg / 60, avg % 60)
}

/// `round(part / whole * 100)`, 0 when `whole` is 0
pub fn percentage(part: i64, whole: i64) -> i64 {
    if whole <= 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as i64
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
pub struct DailyTrend {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub present: u32,
    pub late: u32,
    pub absent: u32,
}

/// Per-day status counts for the seven days ending on `today`
pub fn weekly_trend(today: NaiveDate, records: &[(NaiveDate, AttendanceStatus)]) -> Vec<DailyTrend> {
    let week_start = today - Duration::days(6);
    let mut days: Vec<DailyTrend> = (0..7)
        .map(|i| DailyTrend {
            date: week_start + Duration::days(i),
            present: 0,
            late: 0,
            absent: 0,
        })
        .collect();

    for (date, status) in records {
        let offset = (*date - week_start).num_days();
        let Some(day) = usize::try_from(offset).ok().and_then(|i| days.get_mut(i)) else {
            continue;
        };
        match status {
            AttendanceStatus::OnTime => day.present += 1,
            AttendanceStatus::Late => day.late += 1,
            AttendanceStatus::Absent => day.absent += 1,
            AttendanceStatus::HalfDay => {}
        }
    }

    days
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardRange {
    Week,
    Month,
    Quarter,
}

impl DashboardRange {
    /// `week` and `month` are recognised; anything else means the last three months
    pub fn parse(value: Option<&str>) -> Self {
        match value.unwrap_or("month") {
            "week" => DashboardRange::Week,
            "month" => DashboardRange::Month,
            _ => DashboardRange::Quarter,
        }
    }

    pub fn start(&self, today: NaiveDate) -> NaiveDate {
        match self {
            DashboardRange::Week => today - Duration::days(7),
            DashboardRange::Month => today.checked_sub_months(Months::new(1)).unwrap_or(today),
            DashboardRange::Quarter => today.checked_sub_months(Months::new(3)).unwrap_or(today),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformerRate {
    pub user_id: u64,
    pub total: i64,
    pub on_time: i64,
    pub rate: i64,
}

/// Highest on-time rates first; ties keep their input order
pub fn top_performers(counts: &[(u64, i64, i64)], limit: usize) -> Vec<PerformerRate> {
    let mut rates: Vec<PerformerRate> = counts
        .iter()
        .filter(|(_, total, _)| *total > 0)
        .map(|&(user_id, total, on_time)| PerformerRate {
            user_id,
            total,
            on_time,
            rate: percentage(on_time, total),
        })
        .collect();

    rates.sort_by(|a, b| b.rate.cmp(&a.rate));
    rates.truncate(limit);
    rates
}

/// First and last day of each of the `count` months ending with the month of `today`, oldest first
pub fn month_windows(today: NaiveDate, count: u32) -> Vec<(NaiveDate, NaiveDate)> {
    let Some(current) = today.with_day(1) else {
        return Vec::new();
    };

    (0..count)
        .rev()
        .filter_map(|back| {
            let start = current.checked_sub_months(Months::new(back))?;
            let end = start.checked_add_months(Months::new(1))? - Duration::days(1);
            Some((start, end))
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStat {
    #[schema(example = "Jan 2026")]
    pub month: String,
    pub avg_attendance: i64,
    pub avg_late: i64,
}

pub fn monthly_stat(
    month_start: NaiveDate,
    records: &[AttendanceStatus],
    total_employees: i64,
) -> MonthlyStat {
    let total = records.len() as i64;
    let on_time = records.iter().filter(|s| **s == AttendanceStatus::OnTime).count() as i64;
    let late = records.iter().filter(|s| **s == AttendanceStatus::Late).count() as i64;

    let (avg_attendance, avg_late) = if total > 0 {
        (
            percentage(on_time + late, total_employees.max(1)),
            percentage(late, total),
        )
    } else {
        (0, 0)
    };

    MonthlyStat {
        month: month_start.format("%b %Y").to_string(),
        avg_attendance,
        avg_late,
    }
}
