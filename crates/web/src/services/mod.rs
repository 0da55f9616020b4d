//! Business operations that span repositories, policy, and mail.

pub mod auth;
pub mod commissions;
pub mod email;
pub mod inquiries;
pub mod notifications;

pub use auth::{AuthError, AuthService};
pub use notifications::Notifier;
