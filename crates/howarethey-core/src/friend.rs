//! The friend record and its field-level rules.
//!
//! A friend is one row of the store: a name, the day they were last
//! contacted, an optional birthday and free-text notes. Dates are always held
//! in the canonical encoding from [`crate::date`]; the empty string means
//! "not set" for `birthday` and `notes`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  date::{self, BIRTHDAY, LAST_CONTACTED},
};

/// Store-assigned row identifier.
pub type FriendId = i64;

// ─── Friend ──────────────────────────────────────────────────────────────────

/// A stored friend. Field names on the wire are capitalised
/// (`ID`, `Name`, `LastContacted`, `Birthday`, `Notes`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
  #[serde(rename = "ID")]
  pub id:             FriendId,
  #[serde(rename = "Name")]
  pub name:           String,
  #[serde(rename = "LastContacted")]
  pub last_contacted: String,
  #[serde(rename = "Birthday", default)]
  pub birthday:       String,
  #[serde(rename = "Notes", default)]
  pub notes:          String,
}

impl Friend {
  /// URL-safe lookup key: lowercase, spaces replaced with hyphens.
  pub fn slug(&self) -> String { slugify(&self.name) }

  /// A copy of this record with `last_contacted` set to `day`.
  pub fn contacted_on(&self, day: NaiveDate) -> Friend {
    Friend {
      last_contacted: date::format_date(day),
      ..self.clone()
    }
  }
}

/// Lowercase `name` and replace each space with a hyphen.
pub fn slugify(name: &str) -> String { name.to_lowercase().replace(' ', "-") }

/// First friend whose id equals `id`.
pub fn find_by_id(friends: &[Friend], id: FriendId) -> Option<&Friend> {
  friends.iter().find(|f| f.id == id)
}

/// First friend, in store order, whose slug equals `slug`. Colliding slugs
/// are not disambiguated.
pub fn find_by_slug<'a>(friends: &'a [Friend], slug: &str) -> Option<&'a Friend> {
  friends.iter().find(|f| f.slug() == slug)
}

// ─── NewFriend ───────────────────────────────────────────────────────────────

/// A validated record ready for insertion. The id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFriend {
  pub name:           String,
  pub last_contacted: String,
  pub birthday:       String,
  pub notes:          String,
}

impl NewFriend {
  /// Attach the store-assigned id.
  pub fn with_id(self, id: FriendId) -> Friend {
    Friend {
      id,
      name: self.name,
      last_contacted: self.last_contacted,
      birthday: self.birthday,
      notes: self.notes,
    }
  }
}

// ─── FriendInput ─────────────────────────────────────────────────────────────

/// Client payload for create and partial update.
///
/// Every field is presence-aware. An omitted key and an empty string both
/// mean "leave unchanged"; neither ever clears a stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FriendInput {
  #[serde(rename = "Name", alias = "name")]
  pub name:           Option<String>,
  #[serde(rename = "LastContacted", alias = "lastContacted")]
  pub last_contacted: Option<String>,
  #[serde(rename = "Birthday", alias = "birthday")]
  pub birthday:       Option<String>,
  #[serde(rename = "Notes", alias = "notes")]
  pub notes:          Option<String>,
}

fn provided(field: &Option<String>) -> Option<&str> {
  field.as_deref().filter(|v| !v.is_empty())
}

impl FriendInput {
  /// Canonical `lastContacted`, if one was provided and is well-formed.
  pub fn last_contacted(&self) -> Result<Option<String>> {
    provided(&self.last_contacted)
      .map(|v| date::normalize_date(LAST_CONTACTED, v))
      .transpose()
  }

  /// Canonical `birthday`, if one was provided and is well-formed.
  pub fn birthday(&self) -> Result<Option<String>> {
    provided(&self.birthday)
      .map(|v| date::normalize_date(BIRTHDAY, v))
      .transpose()
  }

  /// Validate a create request. A missing `lastContacted` defaults to
  /// `today`.
  pub fn into_new_friend(self, today: NaiveDate) -> Result<NewFriend> {
    let name = provided(&self.name)
      .filter(|n| !n.trim().is_empty())
      .ok_or(Error::BlankName)?
      .to_owned();
    let last_contacted = self
      .last_contacted()?
      .unwrap_or_else(|| date::format_date(today));
    let birthday = self.birthday()?.unwrap_or_default();

    Ok(NewFriend {
      name,
      last_contacted,
      birthday,
      notes: self.notes.unwrap_or_default(),
    })
  }

  /// Merge this patch over `current`.
  ///
  /// The name and both date fields are validated before anything is
  /// written, so a bad value leaves the result untouched. A name of only
  /// whitespace is rejected just as it is on create.
  pub fn apply_to(&self, current: &Friend) -> Result<Friend> {
    let name = provided(&self.name);
    if name.is_some_and(|n| n.trim().is_empty()) {
      return Err(Error::BlankName);
    }
    let last_contacted = self.last_contacted()?;
    let birthday = self.birthday()?;

    let mut updated = current.clone();
    if let Some(name) = name {
      tracing::debug!(id = current.id, "setting name to {name}");
      updated.name = name.to_owned();
    }
    if let Some(last_contacted) = last_contacted {
      tracing::debug!(id = current.id, "setting last contacted to {last_contacted}");
      updated.last_contacted = last_contacted;
    }
    if let Some(birthday) = birthday {
      tracing::debug!(id = current.id, "setting birthday to {birthday}");
      updated.birthday = birthday;
    }
    if let Some(notes) = provided(&self.notes) {
      tracing::debug!(id = current.id, "setting notes");
      updated.notes = notes.to_owned();
    }
    Ok(updated)
  }
}
