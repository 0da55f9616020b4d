//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//! 5. Authorization guard (guarded routes only)
//! 6. Admin gate (`/admin` only)

pub mod auth;
pub mod authz;
pub mod request_id;
pub mod session;

pub use auth::{CurrentActor, RequireAdmin, RequireUser, clear_current_user, set_current_user};
pub use authz::{Authz, verify_authorization};
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
