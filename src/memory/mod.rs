// Thu Aug 27 2026 - Alex

pub mod enumerate;
pub mod error;
pub mod process;
pub mod region;

pub use enumerate::RegionEnumerator;
pub use error::MemoryError;
pub use process::ProcessMemory;
pub use region::{MemoryRegion, Protection, RegionKind, RegionState};

/// Read access to some address space. Implementors must tolerate concurrent
/// mutation of the target: a read that races a protection change or unmap
/// fails with an error, it never crashes.
pub trait MemoryReader: Send + Sync {
    fn read_bytes(&self, addr: u64, len: usize) -> Result<Vec<u8>, MemoryError>;
}
