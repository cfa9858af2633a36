pub mod builtin;
pub mod bus;
pub mod error;
pub mod fabric;
pub mod gateway;
pub mod master;
pub mod simulator;
pub mod slave;

pub use bus::{BusConfig, ChannelKind, Request, Response};
pub use error::ConfigError;
pub use simulator::utils::log;
pub use simulator::{Simulator, System};
