pub mod config;
pub mod sim;
pub mod simulator;
pub mod system;
pub mod utils;

pub use simulator::Simulator;
pub use system::System;
pub use utils::log;
