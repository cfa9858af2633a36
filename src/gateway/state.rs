use serde::Serialize;

/// Back-to-back pacing.
///
/// `JustAcked`: a transaction finished last tick, so the fabric still holds
/// our grant. A new strobe to the same slave may go straight out; one to a
/// different slave is held back for the `Delay` tick so the lock drops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Pacing {
  #[default]
  Idle,
  JustAcked,
  Delay,
}

impl Pacing {
  /// Whether a new strobe must sit out this tick.
  pub fn must_pause(self, same_slave: bool) -> bool {
    self == Pacing::JustAcked && !same_slave
  }

  /// `strobe` is `Some(same_slave)` when a forwarded host strobe arrived
  /// this tick; `done` when an ack/err completed a transaction.
  pub fn next(self, strobe: Option<bool>, done: bool) -> Pacing {
    if done {
      return Pacing::JustAcked;
    }
    match (self, strobe) {
      (Pacing::JustAcked, Some(false)) => Pacing::Delay,
      _ => Pacing::Idle,
    }
  }
}

/// Load-reserved bookkeeping. Broken by anything other than a matching
/// store-conditional, and by an error response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Reservation {
  #[default]
  Clear,
  Armed(u64),
}

impl Reservation {
  pub fn covers(&self, address: u64) -> bool {
    matches!(self, Reservation::Armed(reserved) if *reserved == address)
  }

  pub fn is_armed(&self) -> bool {
    matches!(self, Reservation::Armed(_))
  }
}
