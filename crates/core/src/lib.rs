//! Coco's Glass Core - commission lifecycle and access rules.
//!
//! This crate holds everything about the studio's domain that does not
//! touch the network or the database:
//! - [`commission`] - the nine-state commission lifecycle and progress notes
//! - [`policy`] - per-resource authorization tables and listing scopes
//! - [`notification`] - which emails domain events trigger
//! - [`catalog`], [`inquiry`], [`user`] - the remaining records
//! - [`types`] - ids, emails, prices, and role/status enums
//!
//! The `web` crate persists these types and serves them over HTTP; the
//! `cli` crate uses them for seeding and account management.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod actor;
pub mod catalog;
pub mod commission;
pub mod inquiry;
pub mod notification;
pub mod policy;
pub mod types;
pub mod user;
pub mod validation;

pub use actor::Actor;
pub use catalog::{Category, CategoryDetails, Work, WorkDetails};
pub use commission::{
    Commission, CommissionDetails, CommissionStatus, CommissionUpdate, Event, NewCommissionUpdate,
    StatusSummary, Transition, TransitionError, UpdateContext,
};
pub use inquiry::{ContactInquiry, InquiryNotes, NewContactInquiry};
pub use notification::Notification;
pub use policy::{Action, Authorizable, NotAuthorized, ResourceKind, Scope, Target};
pub use types::*;
pub use user::{User, UserProfile};
pub use validation::{Validate, ValidationErrors};
