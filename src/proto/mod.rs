// Thu Aug 27 2026 - Alex

pub mod envelope;
pub mod error;
pub mod value;

pub use envelope::{Command, CommandId, Envelope};
pub use error::ProtoError;
pub use value::{parse_value, render_value, ValueType};
