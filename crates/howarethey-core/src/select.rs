//! Weighted random selection.
//!
//! Each friend's weight is the number of whole days since they were last
//! contacted. A single uniform draw over `[0, total)` is walked through the
//! cumulative weights in store order, so friend `i` wins with probability
//! `weight[i] / total` and zero-weight friends can never be reached.

use chrono::NaiveDate;
use rand::Rng;

use crate::{Error, Result, date, friend::Friend};

/// The winner of a draw together with the weight it was drawn at.
#[derive(Debug, Clone, Copy)]
pub struct Pick<'a> {
  pub friend: &'a Friend,
  /// Days since last contact as of the reference date.
  pub days:   u64,
}

/// Draw weight for one friend.
///
/// A last-contacted day after `reference` weighs 0 rather than failing; a
/// malformed date is still a hard error.
pub fn weight(friend: &Friend, reference: NaiveDate) -> Result<u64> {
  match date::days_since(&friend.last_contacted, reference) {
    Ok(days) => Ok(u64::try_from(days).unwrap_or(0)),
    Err(Error::DateInFuture(_)) => Ok(0),
    Err(e) => Err(e),
  }
}

/// Pick one friend with probability proportional to [`weight`].
///
/// Fails with [`Error::NoEligibleContact`] when `friends` is empty or every
/// weight is 0.
pub fn pick_weighted<'a, R>(
  friends: &'a [Friend],
  reference: NaiveDate,
  rng: &mut R,
) -> Result<Pick<'a>>
where
  R: Rng + ?Sized,
{
  // (friend, weight, cumulative weight up to and including this friend)
  let mut table: Vec<(&Friend, u64, u64)> = Vec::with_capacity(friends.len());
  let mut total = 0u64;

  for friend in friends {
    let w = weight(friend, reference)?;
    if w == 0 {
      continue;
    }
    total += w;
    table.push((friend, w, total));
  }

  if total == 0 {
    return Err(Error::NoEligibleContact);
  }

  let r = rng.gen_range(0..total);
  let idx = table.partition_point(|&(_, _, cumulative)| cumulative <= r);
  let (friend, days, _) = table[idx];
  Ok(Pick { friend, days })
}
