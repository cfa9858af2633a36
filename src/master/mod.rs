/// Scripted host cores driving the gateways
pub mod host_core;

pub use host_core::{Completion, HostCore, HostOp};
