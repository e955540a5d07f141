// Thu Aug 27 2026 - Alex

pub mod config;
pub mod ipc;
pub mod memory;
pub mod proto;
pub mod scan;
pub mod service;

pub use config::Config;
pub use ipc::{MessageChannel, RingChannel};
pub use memory::{MemoryReader, MemoryRegion, ProcessMemory, RegionEnumerator};
pub use proto::{Command, Envelope, ValueType};
pub use scan::{Occurrence, Pattern, ScanOrchestrator};
pub use service::ScanService;
