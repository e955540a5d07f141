// Thu Aug 27 2026 - Alex

pub mod error;
pub mod occurrence;
pub mod orchestrator;
pub mod pattern;
pub mod simd;

pub use error::ScanError;
pub use occurrence::Occurrence;
pub use orchestrator::ScanOrchestrator;
pub use pattern::Pattern;
