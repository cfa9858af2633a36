/// Round-robin arbitration over a requester bitmap.
///
/// Bit `i` of `requesters` is master `i`. `last_winner` is one-hot (or zero
/// before the first grant). The scan starts one position after the last
/// winner and wraps; the first set bit is granted. Returns the one-hot grant,
/// or zero when nobody requests.
pub fn arbitrate(requesters: u64, last_winner: u64, width: usize) -> u64 {
  debug_assert!((1..=64).contains(&width));
  let mask = if width >= 64 { u64::MAX } else { (1u64 << width) - 1 };
  let requesters = requesters & mask;
  if requesters == 0 {
    return 0;
  }
  let start = match last_winner & mask {
    0 => 0,
    last => (last.trailing_zeros() as usize + 1) % width,
  };
  for offset in 0..width {
    let bit = (start + offset) % width;
    if requesters & (1u64 << bit) != 0 {
      return 1u64 << bit;
    }
  }
  0
}

/// Index of a one-hot grant.
pub fn one_hot_index(grant: u64) -> Option<usize> {
  if grant == 0 {
    None
  } else {
    Some(grant.trailing_zeros() as usize)
  }
}

/// One arbiter instance: the combinational `arbitrate` plus the registered
/// last winner that rotates priority.
#[derive(Debug, Clone)]
pub struct RoundRobinArbiter {
  width: usize,
  last_winner: u64,
}

impl RoundRobinArbiter {
  pub fn new(width: usize) -> Self {
    Self {
      width,
      last_winner: 0,
    }
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn last_winner(&self) -> u64 {
    self.last_winner
  }

  pub fn peek(&self, requesters: u64) -> u64 {
    arbitrate(requesters, self.last_winner, self.width)
  }

  /// Record a grant so the next round starts after it.
  pub fn update(&mut self, grant: u64) {
    if grant != 0 {
      self.last_winner = grant;
    }
  }

  pub fn reset(&mut self) {
    self.last_winner = 0;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_no_requesters() {
    assert_eq!(arbitrate(0, 0b0100, 4), 0);
  }

  #[test]
  fn test_first_round_starts_at_zero() {
    assert_eq!(arbitrate(0b1010, 0, 4), 0b0010);
  }

  #[test]
  fn test_rotates_after_last_winner() {
    assert_eq!(arbitrate(0b1011, 0b0001, 4), 0b0010);
    assert_eq!(arbitrate(0b1011, 0b0010, 4), 0b1000);
    assert_eq!(arbitrate(0b1011, 0b1000, 4), 0b0001);
  }

  #[test]
  fn test_lone_requester_wins_again() {
    assert_eq!(arbitrate(0b0100, 0b0100, 4), 0b0100);
  }

  #[test]
  fn test_ignores_bits_beyond_width() {
    assert_eq!(arbitrate(0b1_0000, 0, 4), 0);
    assert_eq!(arbitrate(u64::MAX, 1 << 63, 64), 1);
  }

  #[test]
  fn test_arbiter_updates_priority() {
    let mut arb = RoundRobinArbiter::new(3);
    let g = arb.peek(0b111);
    assert_eq!(g, 0b001);
    arb.update(g);
    assert_eq!(arb.peek(0b111), 0b010);
    arb.update(0);
    assert_eq!(arb.last_winner(), 0b001);
    assert_eq!(one_hot_index(0b100), Some(2));
    assert_eq!(one_hot_index(0), None);
  }
}
