// Thu Aug 27 2026 - Alex

use thiserror::Error;

/// Construction-time channel faults. These are fatal to the owning
/// component's startup; runtime transport faults surface as boolean
/// failures from produce/consume instead.
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Invalid segment name: {0}")]
    InvalidName(String),
    #[error("Failed to create shared segment {0}: {1}")]
    CreateFailed(String, std::io::Error),
    #[error("Failed to open shared segment {0}: {1}")]
    OpenFailed(String, std::io::Error),
    #[error("Failed to size shared segment: {0}")]
    ResizeFailed(std::io::Error),
    #[error("Failed to map shared segment: {0}")]
    MapFailed(std::io::Error),
    #[error("Segment is {0} bytes, smaller than the channel header")]
    SegmentTooSmall(usize),
    #[error("Channel capacity must be non-zero")]
    ZeroCapacity,
    #[error("Failed to initialize process-shared {0} (errno {1})")]
    SyncInit(&'static str, i32),
}
