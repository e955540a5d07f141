// Thu Aug 27 2026 - Alex

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Read failed at address 0x{0:x}")]
    ReadFailed(u64),
    #[error("Short read at address 0x{0:x}: got {1} of {2} bytes")]
    ShortRead(u64, usize, usize),
    #[error("Process not found: {0}")]
    ProcessNotFound(i32),
    #[error("Invalid maps entry: {0}")]
    InvalidMapsEntry(String),
}
