// Thu Aug 27 2026 - Alex

use crate::memory::RegionKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One location where a pattern matched, tagged with the owning region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub base_address: u64,
    pub offset: u64,
    pub region_size: u64,
    pub data_size: u64,
    pub kind: RegionKind,
}

impl Occurrence {
    pub fn address(&self) -> u64 {
        self.base_address + self.offset
    }
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:016x}+{} ({} bytes, {} region of {} bytes)",
            self.base_address, self.offset, self.data_size, self.kind, self.region_size
        )
    }
}
