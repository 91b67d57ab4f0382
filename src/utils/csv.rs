use crate::model::attendance::AttendanceWithUser;
use crate::utils::clock::AttendanceClock;

pub const ATTENDANCE_CSV_HEADER: [&str; 7] = [
    "Date",
    "Employee",
    "Department",
    "Check In",
    "Check Out",
    "Status",
    "Work Hours",
];

/// Empty values become `-`; values with separators, quotes or newlines are quoted
pub fn escape_field(value: Option<&str>) -> String {
    let value = match value {
        Some(v) if !v.is_empty() => v,
        _ => return "-".to_string(),
    };

    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn attendance_report(records: &[AttendanceWithUser], clock: &AttendanceClock) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(ATTENDANCE_CSV_HEADER.join(","));

    for record in records {
        let a = &record.attendance;
        let work_hours = match a.work_hours {
            Some(h) if h != 0.0 => format!("{h:.2}h"),
            _ => "-".to_string(),
        };

        let row = [
            escape_field(Some(&a.date.format("%B %-d, %Y").to_string())),
            escape_field(Some(&record.user.name)),
            escape_field(record.user.department.as_deref()),
            clock.time_label(a.check_in_time),
            clock.time_label(a.check_out_time),
            a.status.to_string(),
            work_hours,
        ];
        lines.push(row.join(","));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::{Attendance, AttendanceStatus};
    use crate::model::user::UserSummary;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn escapes_only_when_needed() {
        assert_eq!(escape_field(None), "-");
        assert_eq!(escape_field(Some("")), "-");
        assert_eq!(escape_field(Some("Sales")), "Sales");
        assert_eq!(escape_field(Some("R&D, Labs")), "\"R&D, Labs\"");
        assert_eq!(escape_field(Some("The \"Boss\"")), "\"The \"\"Boss\"\"\"");
    }

    #[test]
    fn report_renders_local_times_and_hours() {
        let check_in = Utc.with_ymd_and_hms(2026, 1, 5, 3, 40, 0).unwrap();
        let check_out = Utc.with_ymd_and_hms(2026, 1, 5, 12, 10, 0).unwrap();
        let record = AttendanceWithUser {
            attendance: Attendance {
                id: 1,
                user_id: 7,
                date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
                check_in_time: Some(check_in),
                check_out_time: Some(check_out),
                check_in_lat: None,
                check_in_lng: None,
                check_out_lat: None,
                check_out_lng: None,
                check_in_addr: None,
                check_out_addr: None,
                status: AttendanceStatus::Late,
                work_hours: Some(8.5),
                notes: None,
                created_at: check_in,
                updated_at: check_out,
            },
            user: UserSummary {
                id: 7,
                name: "Doe, Jane".to_string(),
                email: "jane@company.com".to_string(),
                department: None,
                position: None,
            },
        };

        let csv = attendance_report(&[record], &AttendanceClock::ist());
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Date,Employee,Department,Check In,Check Out,Status,Work Hours");
        assert_eq!(lines[1], "\"January 5, 2026\",\"Doe, Jane\",-,09:10,17:40,LATE,8.50h");
    }
}
