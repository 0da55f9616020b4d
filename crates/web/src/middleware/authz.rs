//! Authorization guard.
//!
//! Every guarded handler must consult the policy engine through [`Authz`]
//! before acting, and every listing must also take its scope from it.
//! [`verify_authorization`] wraps the guarded routes and turns a successful
//! response from a handler that skipped either step into a 500, so a missing
//! check fails loudly instead of leaking data.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};

use cocos_glass_core::policy::{self, Authorizable};
use cocos_glass_core::{Action, Actor, NotAuthorized, Scope, Target};

use super::auth::CurrentActor;
use crate::error::AppError;
use crate::state::AppState;

/// Which policy calls a request has made.
#[derive(Debug, Default)]
pub struct AuthzTracker {
    authorized: AtomicBool,
    listed: AtomicBool,
    scoped: AtomicBool,
}

impl AuthzTracker {
    fn record_authorize(&self, action: Action) {
        self.authorized.store(true, Ordering::Relaxed);
        if action == Action::Index {
            self.listed.store(true, Ordering::Relaxed);
        }
    }

    fn record_scope(&self) {
        self.scoped.store(true, Ordering::Relaxed);
    }

    /// What the handler failed to do, if anything.
    fn missing(&self) -> Option<&'static str> {
        if !self.authorized.load(Ordering::Relaxed) {
            Some("authorize")
        } else if self.listed.load(Ordering::Relaxed) && !self.scoped.load(Ordering::Relaxed) {
            Some("scope")
        } else {
            None
        }
    }
}

/// Extractor pairing the current actor with the request's tracker.
///
/// # Example
///
/// ```rust,ignore
/// async fn show(authz: Authz, Path(id): Path<CommissionId>) -> Result<Json<Commission>> {
///     let commission = load(id).await?;
///     authz.authorize(Action::Show, Target::Record(&commission))?;
///     Ok(Json(commission))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Authz {
    actor: Actor,
    tracker: Arc<AuthzTracker>,
}

impl Authz {
    #[must_use]
    pub const fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Ask the policy for `R` whether the actor may perform `action`.
    ///
    /// # Errors
    ///
    /// Returns [`NotAuthorized`] when the policy denies the action.
    pub fn authorize<R: Authorizable>(
        &self,
        action: Action,
        target: Target<'_, R>,
    ) -> Result<(), NotAuthorized> {
        self.tracker.record_authorize(action);
        let result = policy::authorize(&self.actor, action, target);
        if let Err(denied) = &result {
            tracing::warn!(actor = %self.actor, %action, resource = %denied.resource, "Authorization denied");
        }
        result
    }

    /// Authorize `action` on one record.
    ///
    /// # Errors
    ///
    /// Returns [`NotAuthorized`] when the policy denies the action.
    pub fn authorize_record<R: Authorizable>(
        &self,
        action: Action,
        record: &R,
    ) -> Result<(), NotAuthorized> {
        self.authorize(action, Target::Record(record))
    }

    /// Authorize `action` on the record type as a whole.
    ///
    /// # Errors
    ///
    /// Returns [`NotAuthorized`] when the policy denies the action.
    pub fn authorize_collection<R: Authorizable>(&self, action: Action) -> Result<(), NotAuthorized> {
        self.authorize::<R>(action, Target::Collection)
    }

    /// The records of type `R` the actor may see.
    #[must_use]
    pub fn scope<R: Authorizable>(&self) -> Scope {
        self.tracker.record_scope();
        policy::scope::<R>(&self.actor)
    }
}

impl FromRequestParts<AppState> for Authz {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let tracker = parts
            .extensions
            .get::<Arc<AuthzTracker>>()
            .cloned()
            .ok_or_else(|| AppError::Internal("authorization guard not installed".to_string()))?;
        let CurrentActor(actor) = CurrentActor::from_request_parts(parts, state).await?;
        Ok(Self { actor, tracker })
    }
}

/// Middleware that fails any successful response whose handler skipped
/// `authorize`, or listed records without taking a scope.
pub async fn verify_authorization(mut request: Request, next: Next) -> Response {
    let tracker = Arc::new(AuthzTracker::default());
    request.extensions_mut().insert(Arc::clone(&tracker));
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let response = next.run(request).await;
    if !response.status().is_success() {
        return response;
    }

    match tracker.missing() {
        None => response,
        Some(step) => {
            tracing::error!(%method, %path, missing = step, "Handler skipped an authorization step");
            AppError::Internal(format!("{method} {path} did not call {step}")).into_response()
        }
    }
}
