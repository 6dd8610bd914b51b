//! [`Schedule`] — when a background job fires.
//!
//! Accepted expressions:
//!
//! | Expression | Fires |
//! |------------|-------|
//! | `@hourly` | at the top of every hour |
//! | `@daily`, `@midnight` | every day at 00:00 |
//! | `@weekly` | every Sunday at 00:00 |
//! | `@every <N><s\|m\|h\|d>` | every N seconds/minutes/hours/days |
//! | `daily HH:MM` | every day at HH:MM |
//! | `weekly <mon..sun> HH:MM` | once a week on that day at HH:MM |
//! | `m h dom mon dow` | standard five-field cron, see [`crate::cron`] |
//!
//! Wall-clock schedules are evaluated in the time zone of the `now` passed to
//! [`Schedule::next_after`].

use std::{fmt, str::FromStr};

use chrono::{
  DateTime, Datelike, Days, LocalResult, NaiveDateTime, NaiveTime, TimeDelta, TimeZone,
  Timelike, Weekday,
};

use crate::{Error, Result, cron::CronSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
  /// At minute zero of every hour.
  Hourly,
  /// A fixed interval measured from the previous run.
  Every(TimeDelta),
  /// Every day at a wall-clock time.
  Daily { at: NaiveTime },
  /// One day a week at a wall-clock time.
  Weekly { day: Weekday, at: NaiveTime },
  /// A five-field cron expression.
  Cron(CronSpec),
}

impl Schedule {
  /// The first fire time strictly after `now`.
  pub fn next_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
    let local = now.naive_local();
    match *self {
      Self::Every(interval) => now.clone() + interval,
      Self::Hourly => {
        let top = local
          .date()
          .and_hms_opt(local.hour(), 0, 0)
          .unwrap_or(local);
        resolve(now, top + TimeDelta::hours(1))
      }
      Self::Daily { at } => {
        let mut candidate = local.date().and_time(at);
        if candidate <= local {
          candidate += TimeDelta::days(1);
        }
        resolve(now, candidate)
      }
      Self::Weekly { day, at } => {
        let ahead = (7 + day.num_days_from_monday() - local.weekday().num_days_from_monday()) % 7;
        let mut candidate = (local.date() + Days::new(u64::from(ahead))).and_time(at);
        if candidate <= local {
          candidate += TimeDelta::days(7);
        }
        resolve(now, candidate)
      }
      Self::Cron(spec) => match spec.next_wall_after(local) {
        Some(wall) => resolve(now, wall),
        // Parsing rejects expressions that never fire.
        None => now.clone() + TimeDelta::days(366),
      },
    }
  }
}

/// Map a wall-clock time in `now`'s zone back to an instant. Times skipped by
/// a DST jump move forward an hour; repeated times take whichever occurrence
/// is still ahead of `now`.
fn resolve<Tz: TimeZone>(now: &DateTime<Tz>, mut wall: NaiveDateTime) -> DateTime<Tz> {
  let tz = now.timezone();
  loop {
    match tz.from_local_datetime(&wall) {
      LocalResult::Single(at) => return at,
      LocalResult::Ambiguous(early, late) => {
        return if early > *now { early } else { late };
      }
      LocalResult::None => wall += TimeDelta::hours(1),
    }
  }
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

fn parse_time(text: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(text, "%H:%M").map_err(|_| Error::InvalidTime(text.to_string()))
}

fn parse_interval(text: &str) -> Result<TimeDelta> {
  let invalid = || Error::InvalidInterval(text.to_string());
  let split = text
    .find(|c: char| !c.is_ascii_digit())
    .ok_or_else(invalid)?;
  let (count, unit) = text.split_at(split);
  let count: i64 = count.parse().map_err(|_| invalid())?;
  if count <= 0 {
    return Err(invalid());
  }
  let interval = match unit {
    "s" => TimeDelta::try_seconds(count),
    "m" => TimeDelta::try_minutes(count),
    "h" => TimeDelta::try_hours(count),
    "d" => TimeDelta::try_days(count),
    _ => None,
  };
  interval.ok_or_else(invalid)
}

impl FromStr for Schedule {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let expr = s.trim().to_lowercase();
    let words: Vec<&str> = expr.split_whitespace().collect();
    match words.as_slice() {
      ["@hourly"] => Ok(Self::Hourly),
      // `NaiveTime::default()` is midnight.
      ["@daily"] | ["@midnight"] => Ok(Self::Daily { at: NaiveTime::default() }),
      ["@weekly"] => Ok(Self::Weekly {
        day: Weekday::Sun,
        at:  NaiveTime::default(),
      }),
      ["@every", interval] => Ok(Self::Every(parse_interval(interval)?)),
      ["daily", time] => Ok(Self::Daily { at: parse_time(time)? }),
      ["weekly", day, time] => {
        let day = day
          .parse::<Weekday>()
          .map_err(|_| Error::UnknownSchedule(s.to_string()))?;
        Ok(Self::Weekly { day, at: parse_time(time)? })
      }
      [minute, hour, day, month, weekday] if !minute.starts_with('@') => {
        Ok(Self::Cron(CronSpec::parse([minute, hour, day, month, weekday])?))
      }
      _ => Err(Error::UnknownSchedule(s.to_string())),
    }
  }
}

impl fmt::Display for Schedule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Hourly => f.write_str("@hourly"),
      Self::Every(interval) => {
        let secs = interval.num_seconds();
        if secs % 86_400 == 0 {
          write!(f, "@every {}d", secs / 86_400)
        } else if secs % 3_600 == 0 {
          write!(f, "@every {}h", secs / 3_600)
        } else if secs % 60 == 0 {
          write!(f, "@every {}m", secs / 60)
        } else {
          write!(f, "@every {secs}s")
        }
      }
      Self::Daily { at } => write!(f, "daily {}", at.format("%H:%M")),
      Self::Weekly { day, at } => {
        write!(f, "weekly {} {}", day.to_string().to_lowercase(), at.format("%H:%M"))
      }
      Self::Cron(spec) => write!(f, "{spec}"),
    }
  }
}
