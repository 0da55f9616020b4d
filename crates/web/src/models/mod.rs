//! Types owned by the web layer rather than the domain core.

pub mod session;

pub use session::{CurrentUser, keys as session_keys};
