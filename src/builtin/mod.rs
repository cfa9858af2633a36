/// Building blocks shared by every clocked component
pub mod reg;

pub use reg::Reg;

/// A clocked component.
///
/// Outputs are always recomputed from the registered state and the current
/// tick's inputs; `commit` is the clock edge that makes next-state visible.
pub trait Module {
  fn name(&self) -> &str;

  /// Registered state becomes the staged next-state.
  fn commit(&mut self);

  /// Back to the power-on state.
  fn reset(&mut self);
}
