use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

/// Once-a-day trigger at a fixed local time, Monday to Friday only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    pub at: NaiveTime,
}

impl DailySchedule {
    pub fn new(at: NaiveTime) -> Self {
        Self { at }
    }

    /// First market-day run strictly after `now`.
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let mut date = now.date();
        if date.and_time(self.at) <= now {
            date += Duration::days(1);
        }
        while !is_market_day(date) {
            date += Duration::days(1);
        }
        date.and_time(self.at)
    }
}

/// Weekdays count as market days; exchange holidays are not modelled.
pub fn is_market_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn dt(y: i32, mo: u32, d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d).unwrap().and_time(at(h, m))
    }

    #[test]
    fn same_day_when_time_not_reached() {
        // 2024-06-04 is a Tuesday
        let s = DailySchedule::new(at(9, 0));
        assert_eq!(s.next_after(dt(2024, 6, 4, 8, 15)), dt(2024, 6, 4, 9, 0));
    }

    #[test]
    fn next_day_when_time_passed_or_equal() {
        let s = DailySchedule::new(at(9, 0));
        assert_eq!(s.next_after(dt(2024, 6, 4, 9, 0)), dt(2024, 6, 5, 9, 0));
        assert_eq!(s.next_after(dt(2024, 6, 4, 17, 0)), dt(2024, 6, 5, 9, 0));
    }

    #[test]
    fn weekends_are_skipped() {
        let s = DailySchedule::new(at(14, 30));
        // Friday after the run -> Monday
        assert_eq!(s.next_after(dt(2024, 6, 7, 15, 0)), dt(2024, 6, 10, 14, 30));
        // Saturday morning -> Monday
        assert_eq!(s.next_after(dt(2024, 6, 8, 8, 0)), dt(2024, 6, 10, 14, 30));
    }

    #[test]
    fn market_days_are_weekdays() {
        assert!(is_market_day(NaiveDate::from_ymd_opt(2024, 6, 7).unwrap()));
        assert!(!is_market_day(NaiveDate::from_ymd_opt(2024, 6, 8).unwrap()));
        assert!(!is_market_day(NaiveDate::from_ymd_opt(2024, 6, 9).unwrap()));
    }
}
