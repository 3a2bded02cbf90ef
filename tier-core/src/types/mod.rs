//! Tier Core Types

mod file;
mod job;
mod tier;

pub use file::*;
pub use job::*;
pub use tier::*;
