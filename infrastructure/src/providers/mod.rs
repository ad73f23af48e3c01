//! Model backends and the fallback group that combines them into seats.

pub mod command;
pub mod fallback;
pub mod http;
pub mod registry;

pub use command::{CommandBackend, CommandBackendConfig};
pub use fallback::{DEFAULT_COOLDOWN, EmptyGroupError, FallbackGroup};
pub use http::{HttpBackend, HttpBackendConfig};
pub use registry::{RegistryError, adhoc_seats, build_seats, build_seats_with};
