/// Interconnect: decode, arbitration, crossbar, single-master mux, remap
pub mod arbiter;
pub mod crossbar;
pub mod decoder;
pub mod error_sink;
pub mod mux;
pub mod remap;

pub use arbiter::{arbitrate, RoundRobinArbiter};
pub use crossbar::Crossbar;
pub use decoder::{decode, MemoryMap, MemoryMapEntry, Target};
pub use error_sink::ErrorSink;
pub use mux::StaticMux;
pub use remap::{AddressRemapper, RemapRange};
