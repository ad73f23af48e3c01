//! Deliberation domain
//!
//! - [`value_objects::BackendResponse`]: one seat's settled answer (or error)
//! - [`value_objects::DeliberationResult`]: every seat's response for one prompt
//! - [`value_objects::SeatProgress`]: per-completion progress payload
//! - [`stream::StreamEvent`]: chunks of a streaming backend query

pub mod stream;
pub mod value_objects;
