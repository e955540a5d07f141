// Thu Aug 27 2026 - Alex

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProtoError {
    #[error("Message truncated")]
    Truncated,
    #[error("Unknown command id {0}")]
    UnknownCommand(u16),
    #[error("Unknown value type {0}")]
    UnknownValueType(u8),
    #[error("Unknown region kind {0}")]
    UnknownRegionKind(u8),
    #[error("Invalid {0} value: {1}")]
    InvalidValue(&'static str, String),
}
