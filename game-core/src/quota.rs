use chrono::{DateTime, Days, Local, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use game_types::GameError;

pub const DEFAULT_MAX_GAMES_PER_DAY: u32 = 3;

/// How many games a user may start per calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyQuota {
    pub max_games_per_day: u32,
}

impl Default for DailyQuota {
    fn default() -> Self {
        Self {
            max_games_per_day: DEFAULT_MAX_GAMES_PER_DAY,
        }
    }
}

impl DailyQuota {
    pub fn new(max_games_per_day: u32) -> Self {
        Self { max_games_per_day }
    }

    /// Whether another game may start given the games already started today.
    pub fn can_start_game(&self, games_today: u64) -> bool {
        games_today < u64::from(self.max_games_per_day)
    }

    pub fn ensure_can_start(&self, games_today: u64) -> Result<(), GameError> {
        if self.can_start_game(games_today) {
            Ok(())
        } else {
            Err(GameError::QuotaExceeded {
                limit: self.max_games_per_day,
            })
        }
    }

    pub fn remaining_games(&self, games_today: u64) -> u32 {
        u64::from(self.max_games_per_day)
            .saturating_sub(games_today)
            .try_into()
            .unwrap_or(0)
    }
}

/// Server-local calendar date of an instant.
pub fn local_date(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&Local).date_naive()
}

/// Half-open UTC interval `[start, end)` covering `date` in timezone `tz`.
pub fn day_bounds<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
    (start_of_day(date, tz), start_of_day(next, tz))
}

fn start_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        // Midnight skipped by a DST jump; the day starts at the first valid hour
        LocalResult::None => (1..=3)
            .find_map(|hours| {
                tz.from_local_datetime(&(midnight + chrono::Duration::hours(hours)))
                    .earliest()
            })
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| midnight.and_utc()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_default_quota() {
        assert_eq!(DailyQuota::default().max_games_per_day, 3);
    }

    #[test]
    fn test_can_start_game_bounds() {
        let quota = DailyQuota::default();
        assert!(quota.can_start_game(0));
        assert!(quota.can_start_game(1));
        assert!(quota.can_start_game(2));
        assert!(!quota.can_start_game(3));
        assert!(!quota.can_start_game(10));
    }

    #[test]
    fn test_ensure_can_start() {
        let quota = DailyQuota::new(1);
        assert!(quota.ensure_can_start(0).is_ok());
        assert_eq!(
            quota.ensure_can_start(1),
            Err(GameError::QuotaExceeded { limit: 1 })
        );
    }

    #[test]
    fn test_remaining_games() {
        let quota = DailyQuota::default();
        assert_eq!(quota.remaining_games(0), 3);
        assert_eq!(quota.remaining_games(2), 1);
        assert_eq!(quota.remaining_games(3), 0);
        assert_eq!(quota.remaining_games(7), 0);
    }

    #[test]
    fn test_day_bounds_utc() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let (start, end) = day_bounds(date, &Utc);

        assert_eq!(start.to_rfc3339(), "2024-03-15T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2024-03-16T00:00:00+00:00");
    }

    #[test]
    fn test_day_bounds_with_offset() {
        // Local midnight at UTC+2 is 22:00 UTC on the previous day
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let (start, end) = day_bounds(date, &tz);

        assert_eq!(start.to_rfc3339(), "2024-03-14T22:00:00+00:00");
        assert_eq!(end - start, chrono::Duration::hours(24));
    }
}
