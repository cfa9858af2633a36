/// A register: `q` is what the rest of the design sees this tick, `d` is
/// staged by the combinational logic and only becomes `q` on `commit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reg<T: Clone> {
  q: T,
  d: T,
  init: T,
}

impl<T: Clone> Reg<T> {
  pub fn new(init: T) -> Self {
    Self {
      q: init.clone(),
      d: init.clone(),
      init,
    }
  }

  /// Current registered output.
  pub fn get(&self) -> &T {
    &self.q
  }

  /// Stage the next value. Last write in a tick wins.
  pub fn set(&mut self, value: T) {
    self.d = value;
  }

  /// Value staged for the next tick.
  pub fn next(&self) -> &T {
    &self.d
  }

  /// Clock edge. `d` keeps its value, so a register that is not written
  /// in a tick holds.
  pub fn commit(&mut self) {
    self.q = self.d.clone();
  }

  pub fn reset(&mut self) {
    self.q = self.init.clone();
    self.d = self.init.clone();
  }
}

impl<T: Clone + Default> Default for Reg<T> {
  fn default() -> Self {
    Self::new(T::default())
  }
}
