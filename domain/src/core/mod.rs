//! Core domain concepts shared across all subdomains.
//!
//! - [`question::Question`]: a validated prompt to put to every seat
//! - [`attachment::Attachment`]: a file handed to backends alongside the prompt
//! - [`error::DomainError`]: domain-level errors

pub mod attachment;
pub mod error;
pub mod question;
