//! Calendar-day arithmetic over the two accepted date encodings.
//!
//! Dates arrive either as `DD/MM/YYYY` or `YYYY-MM-DD`. The canonical stored
//! form is `DD/MM/YYYY`; anything accepted on input converts to it without
//! loss. All arithmetic happens on [`NaiveDate`], so there is no sub-day
//! precision and no timezone drift once the reference day is chosen.

use chrono::{Local, NaiveDate};

use crate::{Error, Result};

/// `strftime` pattern of the canonical stored encoding.
pub const CANONICAL_FORMAT: &str = "%d/%m/%Y";

/// `strftime` pattern of the ISO input encoding.
pub const ISO_FORMAT: &str = "%Y-%m-%d";

/// Field label used in errors about `lastContacted`.
pub const LAST_CONTACTED: &str = "last contacted date";

/// Field label used in errors about `birthday`.
pub const BIRTHDAY: &str = "birthday";

// ─── Encodings ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
  DayMonthYear,
  YearMonthDay,
}

impl Encoding {
  /// Strict shape check: two-digit day and month, four-digit year.
  fn detect(s: &str) -> Option<Self> {
    if has_shape(s, "99/99/9999") {
      Some(Self::DayMonthYear)
    } else if has_shape(s, "9999-99-99") {
      Some(Self::YearMonthDay)
    } else {
      None
    }
  }

  fn format(self) -> &'static str {
    match self {
      Self::DayMonthYear => CANONICAL_FORMAT,
      Self::YearMonthDay => ISO_FORMAT,
    }
  }
}

/// `9` in `pattern` matches any ASCII digit; every other byte must match
/// literally.
fn has_shape(s: &str, pattern: &str) -> bool {
  s.len() == pattern.len()
    && s.bytes().zip(pattern.bytes()).all(|(c, p)| match p {
      b'9' => c.is_ascii_digit(),
      _ => c == p,
    })
}

// ─── Parsing and formatting ──────────────────────────────────────────────────

/// Parse `value` under either accepted encoding.
///
/// `field` only labels the error; it has no effect on parsing.
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate> {
  let invalid = || Error::InvalidDateFormat {
    field,
    value: value.to_owned(),
  };
  let encoding = Encoding::detect(value).ok_or_else(invalid)?;
  NaiveDate::parse_from_str(value, encoding.format()).map_err(|_| invalid())
}

/// Render a date in the canonical `DD/MM/YYYY` encoding.
pub fn format_date(date: NaiveDate) -> String {
  date.format(CANONICAL_FORMAT).to_string()
}

/// Validate `value` and convert it to the canonical encoding.
pub fn normalize_date(field: &'static str, value: &str) -> Result<String> {
  parse_date(field, value).map(format_date)
}

/// The caller's local calendar day.
pub fn today() -> NaiveDate { Local::now().date_naive() }

// ─── Arithmetic ──────────────────────────────────────────────────────────────

/// Whole calendar days from `last_contacted` up to `reference`.
///
/// Fails with [`Error::InvalidDateFormat`] when the stored string does not
/// parse and with [`Error::DateInFuture`] when it names a day after
/// `reference`.
pub fn days_since(last_contacted: &str, reference: NaiveDate) -> Result<i64> {
  let date = parse_date(LAST_CONTACTED, last_contacted)?;
  if date > reference {
    return Err(Error::DateInFuture(last_contacted.to_owned()));
  }
  Ok((reference - date).num_days())
}
