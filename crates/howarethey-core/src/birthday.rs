//! Yearly birthday matching.

use chrono::{Datelike, NaiveDate};

use crate::{
  date::{self, BIRTHDAY},
  friend::Friend,
};

/// `true` when `friend`'s birthday falls on `today`'s month and day.
///
/// An unset birthday never matches. A stored birthday that fails to parse is
/// logged and treated as unset.
pub fn is_birthday(friend: &Friend, today: NaiveDate) -> bool {
  if friend.birthday.is_empty() {
    return false;
  }
  match date::parse_date(BIRTHDAY, &friend.birthday) {
    Ok(born) => born.month() == today.month() && born.day() == today.day(),
    Err(e) => {
      tracing::warn!(id = friend.id, "skipping birthday check: {e}");
      false
    }
  }
}

/// Every friend whose birthday is `today`, in store order.
pub fn find_birthdays(friends: &[Friend], today: NaiveDate) -> Vec<Friend> {
  friends
    .iter()
    .filter(|f| is_birthday(f, today))
    .cloned()
    .collect()
}

/// Notification text for a batch of birthday matches; `None` for no matches.
pub fn birthday_message(matches: &[Friend]) -> Option<String> {
  match matches {
    [] => None,
    [only] => Some(format!(
      "It's {}'s birthday today! You should say happy birthday.",
      only.name
    )),
    [init @ .., last] => {
      let names = init
        .iter()
        .map(|f| f.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
      Some(format!(
        "It's {names} and {}'s birthdays today! You should say happy birthday to them.",
        last.name
      ))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn friend(id: i64, name: &str, birthday: &str) -> Friend {
    Friend {
      id,
      name: name.into(),
      last_contacted: "06/06/2023".into(),
      birthday: birthday.into(),
      notes: String::new(),
    }
  }

  fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn matches_month_and_day_ignoring_year() {
    let friends = vec![
      friend(1, "John Wick", "23/02/1996"),
      friend(2, "Peter Parker", "20/10/1996"),
    ];
    let found = find_birthdays(&friends, ymd(2020, 2, 23));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "John Wick");
  }

  #[test]
  fn no_match_returns_empty() {
    let friends = vec![friend(1, "John Wick", "23/02/1996")];
    assert!(find_birthdays(&friends, ymd(2020, 1, 10)).is_empty());
  }

  #[test]
  fn unset_birthday_never_matches() {
    let friends = vec![friend(1, "Nobody", "")];
    assert!(find_birthdays(&friends, ymd(2020, 2, 23)).is_empty());
  }

  #[test]
  fn iso_stored_birthday_still_matches() {
    let f = friend(1, "Legacy", "1996-02-23");
    assert!(is_birthday(&f, ymd(2020, 2, 23)));
  }

  #[test]
  fn single_match_message() {
    let msg = birthday_message(&[friend(1, "John Wick", "23/02/1996")]).unwrap();
    assert_eq!(msg, "It's John Wick's birthday today! You should say happy birthday.");
  }

  #[test]
  fn many_matches_message() {
    let msg = birthday_message(&[
      friend(1, "John Wick", "23/02/1996"),
      friend(2, "Peter Parker", "23/02/2001"),
      friend(3, "Jack Reacher", "23/02/1960"),
    ])
    .unwrap();
    assert_eq!(
      msg,
      "It's John Wick, Peter Parker and Jack Reacher's birthdays today! \
       You should say happy birthday to them."
    );
  }

  #[test]
  fn no_matches_no_message() {
    assert!(birthday_message(&[]).is_none());
  }
}
