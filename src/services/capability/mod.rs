pub mod client;
pub mod error;

pub use client::{CallMeta, CapabilityClient};
pub use error::{DownstreamError, DownstreamErrorKind, FieldViolation};
