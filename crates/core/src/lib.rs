#![forbid(unsafe_code)]

pub mod access;
pub mod error;
pub mod model;
pub mod sequence;
pub mod time;

pub use access::{AccessDecision, LockReason, PREVIEW_LIMIT, evaluate_access};
pub use error::Error;
pub use time::Clock;
