// Thu Aug 27 2026 - Alex

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScanError {
    #[error("Pattern must not be empty")]
    EmptyPattern,
}
