use std::time::Duration;

use chrono::{DateTime, Days, NaiveTime, Utc};

/// Time left until the next 00:00 UTC boundary.
///
/// Exactly at midnight the next run is a full day away, so a sweep that
/// finishes within the same second is never repeated.
pub fn duration_until_next_midnight(now: DateTime<Utc>) -> Duration {
    let next_midnight = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .map(|date| date.and_time(NaiveTime::MIN).and_utc());

    match next_midnight {
        Some(next) => (next - now).to_std().unwrap_or(Duration::ZERO),
        None => Duration::from_secs(24 * 60 * 60),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};

    use super::duration_until_next_midnight;

    #[test]
    fn waits_until_end_of_current_day() {
        let now = Utc
            .with_ymd_and_hms(2026, 3, 14, 22, 30, 0)
            .single()
            .unwrap_or_else(|| panic!("test"));

        assert_eq!(
            duration_until_next_midnight(now),
            Duration::from_secs(90 * 60)
        );
    }

    #[test]
    fn midnight_schedules_the_following_day() {
        let now = Utc
            .with_ymd_and_hms(2026, 3, 14, 0, 0, 0)
            .single()
            .unwrap_or_else(|| panic!("test"));

        assert_eq!(
            duration_until_next_midnight(now),
            Duration::from_secs(24 * 60 * 60)
        );
    }

    #[test]
    fn crosses_month_and_year_boundaries() {
        let now = Utc
            .with_ymd_and_hms(2026, 12, 31, 23, 59, 59)
            .single()
            .unwrap_or_else(|| panic!("test"));

        assert_eq!(duration_until_next_midnight(now), Duration::from_secs(1));
    }
}
