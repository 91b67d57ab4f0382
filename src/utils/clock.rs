use anyhow::{Result, anyhow};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Timelike, Utc};

pub const IST_OFFSET_MINUTES: i32 = 5 * 60 + 30;

/// Converts stored UTC instants to the wall clock of the attendance time zone.
///
/// Every attendance-day boundary and lateness comparison goes through this type,
/// so check-in, check-out and the dashboards agree on what "today" is.
#[derive(Debug, Clone, Copy)]
pub struct AttendanceClock {
    offset: FixedOffset,
}

impl AttendanceClock {
    pub fn from_offset_minutes(minutes: i32) -> Result<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(|offset| Self { offset })
            .ok_or_else(|| anyhow!("UTC offset of {minutes} minutes is out of range"))
    }

    #[cfg(test)]
    pub fn ist() -> Self {
        Self {
            offset: FixedOffset::east_opt(IST_OFFSET_MINUTES * 60).expect("IST offset is valid"),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    pub fn local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.offset).naive_local()
    }

    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.local(instant).date()
    }

    pub fn today(&self) -> NaiveDate {
        self.day_of(self.now())
    }

    /// Minutes since local midnight
    pub fn minutes_of_day(&self, instant: DateTime<Utc>) -> u32 {
        let local = self.local(instant);
        local.hour() * 60 + local.minute()
    }

    /// `HH:MM` in local time, `-` when absent
    pub fn time_label(&self, instant: Option<DateTime<Utc>>) -> String {
        match instant {
            Some(at) => self.local(at).format("%H:%M").to_string(),
            None => "-".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn evening_utc_is_next_day_in_ist() {
        let clock = AttendanceClock::ist();
        let instant = Utc.with_ymd_and_hms(2026, 3, 9, 20, 0, 0).unwrap();

        assert_eq!(clock.day_of(instant), NaiveDate::from_ymd_opt(2026, 3, 10).unwrap());
        assert_eq!(clock.minutes_of_day(instant), 90);
        assert_eq!(clock.time_label(Some(instant)), "01:30");
    }

    #[test]
    fn zero_offset_keeps_utc_day() {
        let clock = AttendanceClock::from_offset_minutes(0).unwrap();
        let instant = Utc.with_ymd_and_hms(2026, 3, 9, 23, 59, 0).unwrap();

        assert_eq!(clock.day_of(instant), NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());
        assert_eq!(clock.time_label(None), "-");
    }

    #[test]
    fn rejects_impossible_offsets() {
        assert!(AttendanceClock::from_offset_minutes(24 * 60).is_err());
        assert!(AttendanceClock::from_offset_minutes(i32::MAX).is_err());
        assert!(AttendanceClock::from_offset_minutes(i32::MIN).is_err());
    }
}
