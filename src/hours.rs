use std::fmt::{Display, Formatter};

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Weekday};
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    #[error("hour {0} is not in the range 0-23")]
    HourOutOfRange(u32),

    #[error("the working day starts at {start}:00 but ends at {end}:00")]
    EmptyDailyWindow { start: u32, end: u32 },
}

/// Where an incoming call goes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, derive_more::Display)]
pub enum RoutingDecision {
    #[display("forward")]
    Forward,

    #[display("voicemail")]
    Voicemail,
}

/// Recurring weekly business hours, for example Monday through Friday, 8 through 18.
///
/// The window is checked as two gates which must both pass:
///
/// - the *week* span runs from the most recent `start_day` at `start_hour`
///   till the first `end_day` on or after it at `end_hour`;
/// - the *day* span runs from `start_hour` till `end_hour` of the current date.
///
/// All bounds are inclusive. The wall-clock (local) time of the instant is used.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[must_use]
pub struct WeeklyWindow {
    start_day: Weekday,
    end_day: Weekday,
    start_time: NaiveTime,
    end_time: NaiveTime,
}

impl WeeklyWindow {
    pub fn try_new(
        start_day: Weekday,
        end_day: Weekday,
        start_hour: u32,
        end_hour: u32,
    ) -> Result<Self, ConfigError> {
        let start_time = NaiveTime::from_hms_opt(start_hour, 0, 0)
            .ok_or(ConfigError::HourOutOfRange(start_hour))?;
        let end_time = NaiveTime::from_hms_opt(end_hour, 0, 0)
            .ok_or(ConfigError::HourOutOfRange(end_hour))?;
        if start_time > end_time {
            return Err(ConfigError::EmptyDailyWindow { start: start_hour, end: end_hour });
        }
        Ok(Self { start_day, end_day, start_time, end_time })
    }

    #[must_use]
    pub fn contains<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        let now = now.naive_local();
        let today = now.date();

        let week_start = most_recent(today, self.start_day).and_time(self.start_time);
        let week_end = next_on_or_after(week_start.date(), self.end_day).and_time(self.end_time);
        let day_start = today.and_time(self.start_time);
        let day_end = today.and_time(self.end_time);

        !(is_before(now, week_start)
            || is_after(now, week_end)
            || is_before(now, day_start)
            || is_after(now, day_end))
    }

    pub fn decide<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> RoutingDecision {
        if self.contains(now) { RoutingDecision::Forward } else { RoutingDecision::Voicemail }
    }
}

impl Display for WeeklyWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{} {}-{}",
            self.start_day,
            self.end_day,
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M"),
        )
    }
}

fn is_before(instant: NaiveDateTime, bound: NaiveDateTime) -> bool {
    instant < bound
}

fn is_after(instant: NaiveDateTime, bound: NaiveDateTime) -> bool {
    instant > bound
}

/// The latest date falling on `weekday`, `date` itself included.
fn most_recent(date: NaiveDate, weekday: Weekday) -> NaiveDate {
    let n_days = (date.weekday().num_days_from_monday() + 7 - weekday.num_days_from_monday()) % 7;
    date - Days::new(u64::from(n_days))
}

/// The earliest date falling on `weekday`, `date` itself included.
fn next_on_or_after(date: NaiveDate, weekday: Weekday) -> NaiveDate {
    let n_days = (weekday.num_days_from_monday() + 7 - date.weekday().num_days_from_monday()) % 7;
    date + Days::new(u64::from(n_days))
}
