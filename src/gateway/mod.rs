/// Host bus adapter in front of every fabric master port
pub mod gateway;
pub mod host;
pub mod state;

pub use gateway::{GatewayStats, ProtocolGateway, SC_FAILURE, SC_SUCCESS};
pub use host::{AtomicKind, HostRequest, HostResponse};
pub use state::{Pacing, Reservation};
