use serde::Serialize;

/// Something worth keeping from a tick: a grant, a completion, an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
  pub tick: u64,
  pub component: String,
  pub action: String,
  pub subject: String,
}

/// Push a `Record` stamped with the current tick
///
/// Usage:
/// ```ignore
/// record!(self, "xbar", "grant", "port 0 -> master 1");
/// record!(self, name, "done", format!("data={:#x}", data));
/// ```
#[macro_export]
macro_rules! record {
  ($self:expr, $component:expr, $action:expr, $subject:expr) => {
    $self.records.push($crate::simulator::sim::records::Record {
      tick: $self.tick,
      component: $component.to_string(),
      action: $action.to_string(),
      subject: $subject.to_string(),
    });
  };
}
