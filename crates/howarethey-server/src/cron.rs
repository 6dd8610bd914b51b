//! Five-field cron expressions: `minute hour day-of-month month day-of-week`.
//!
//! Each field takes `*`, a number, a range `a-b`, a step `*/n` or `a-b/n`,
//! or a comma-separated list of those. Day-of-week runs 0-7 with both 0 and 7
//! meaning Sunday. When day-of-month and day-of-week are both restricted, a
//! day matching either one fires, as in classic cron.

use std::fmt;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Timelike};

use crate::{Error, Result};

/// How far ahead to look for a matching day. Nine years always spans a
/// 29 February, even across a skipped century leap year.
const SEARCH_DAYS: u64 = 366 * 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CronSpec {
  minutes:  u64,
  hours:    u32,
  days:     u32,
  months:   u16,
  weekdays: u8,
  any_day:  bool,
  any_dow:  bool,
}

#[derive(Clone, Copy)]
struct Field {
  name: &'static str,
  min:  u32,
  max:  u32,
}

const MINUTE: Field = Field { name: "minute", min: 0, max: 59 };
const HOUR: Field = Field { name: "hour", min: 0, max: 23 };
const DAY: Field = Field { name: "day of month", min: 1, max: 31 };
const MONTH: Field = Field { name: "month", min: 1, max: 12 };
const WEEKDAY: Field = Field { name: "day of week", min: 0, max: 7 };

impl Field {
  fn invalid(self, text: &str) -> Error {
    Error::InvalidCronField {
      field: self.name,
      value: text.to_string(),
    }
  }

  fn number(self, text: &str, whole: &str) -> Result<u32> {
    let n: u32 = text.parse().map_err(|_| self.invalid(whole))?;
    if (self.min..=self.max).contains(&n) {
      Ok(n)
    } else {
      Err(self.invalid(whole))
    }
  }

  /// Bit `n` set for every value `n` the field admits.
  fn parse(self, text: &str) -> Result<u64> {
    let mut mask = 0u64;
    for part in text.split(',') {
      let (range, step) = match part.split_once('/') {
        Some((range, step)) => {
          let step: u32 = step.parse().map_err(|_| self.invalid(text))?;
          if step == 0 {
            return Err(self.invalid(text));
          }
          (range, Some(step))
        }
        None => (part, None),
      };
      let (lo, hi) = match range.split_once('-') {
        _ if range == "*" => (self.min, self.max),
        Some((lo, hi)) => (self.number(lo, text)?, self.number(hi, text)?),
        None => {
          let n = self.number(range, text)?;
          (n, if step.is_some() { self.max } else { n })
        }
      };
      if lo > hi {
        return Err(self.invalid(text));
      }
      let mut n = lo;
      while n <= hi {
        mask |= 1u64 << n;
        n += step.unwrap_or(1);
      }
    }
    Ok(mask)
  }
}

impl CronSpec {
  pub fn parse(fields: [&str; 5]) -> Result<Self> {
    let [minute, hour, day, month, weekday] = fields;
    let mut weekdays = WEEKDAY.parse(weekday)?;
    // 7 is another name for Sunday.
    if weekdays & (1u64 << 7) != 0 {
      weekdays = (weekdays | 1) & 0x7f;
    }
    let spec = Self {
      minutes:  MINUTE.parse(minute)?,
      hours:    HOUR.parse(hour)? as u32,
      days:     DAY.parse(day)? as u32,
      months:   MONTH.parse(month)? as u16,
      weekdays: weekdays as u8,
      any_day:  day == "*",
      any_dow:  weekday == "*",
    };
    let epoch = NaiveDate::from_ymd_opt(2000, 1, 1)
      .and_then(|d| d.and_hms_opt(0, 0, 0))
      .ok_or_else(|| Error::NeverFires(fields.join(" ")))?;
    if spec.next_wall_after(epoch).is_none() {
      return Err(Error::NeverFires(fields.join(" ")));
    }
    Ok(spec)
  }

  fn matches_day(&self, date: NaiveDate) -> bool {
    if self.months & (1u16 << date.month()) == 0 {
      return false;
    }
    let day = self.days & (1u32 << date.day()) != 0;
    let dow = self.weekdays & (1u8 << date.weekday().num_days_from_sunday()) != 0;
    if self.any_day || self.any_dow {
      day && dow
    } else {
      day || dow
    }
  }

  /// The first matching wall-clock minute strictly after `after`.
  pub fn next_wall_after(&self, after: NaiveDateTime) -> Option<NaiveDateTime> {
    let start = after.with_second(0)?.with_nanosecond(0)? + chrono::TimeDelta::minutes(1);
    for offset in 0..SEARCH_DAYS {
      let date = start.date().checked_add_days(Days::new(offset))?;
      if !self.matches_day(date) {
        continue;
      }
      let (first_hour, first_minute) = if offset == 0 {
        (start.hour(), start.minute())
      } else {
        (0, 0)
      };
      for hour in first_hour..24 {
        if self.hours & (1u32 << hour) == 0 {
          continue;
        }
        let from = if hour == first_hour { first_minute } else { 0 };
        if let Some(minute) = (from..60).find(|&m| self.minutes & (1u64 << m) != 0) {
          return date.and_hms_opt(hour, minute, 0);
        }
      }
    }
    None
  }
}

fn write_field(f: &mut fmt::Formatter<'_>, mask: u64, field: Field) -> fmt::Result {
  let values: Vec<String> = (field.min..=field.max)
    .filter(|&n| mask & (1u64 << n) != 0)
    .map(|n| n.to_string())
    .collect();
  f.write_str(&values.join(","))
}

impl fmt::Display for CronSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write_field(f, self.minutes, MINUTE)?;
    f.write_str(" ")?;
    write_field(f, self.hours.into(), HOUR)?;
    f.write_str(" ")?;
    if self.any_day {
      f.write_str("*")?;
    } else {
      write_field(f, self.days.into(), DAY)?;
    }
    f.write_str(" ")?;
    write_field(f, self.months.into(), MONTH)?;
    f.write_str(" ")?;
    if self.any_dow {
      f.write_str("*")
    } else {
      write_field(f, self.weekdays.into(), WEEKDAY)
    }
  }
}
