/// Request/response channel shapes and bus widths
pub mod channel;
pub mod config;

pub use channel::{ChannelKind, Request, Response};
pub use config::BusConfig;
