//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod ask;
pub mod consult;
pub mod deliberate;
pub(crate) mod shared;
