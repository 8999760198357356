//! Handler traits and type erasure.
//!
//! Two ways to write a handler:
//!
//! - a plain function or closure, registered with [`Router::on`]:
//!
//!   ```text
//!   fn name(req: &Request, params: &[String]) -> Result<impl IntoReply, ApiError>
//!   ```
//!
//! - a type implementing [`Controller`], which carries its own URI template
//!   and allowed method, registered with [`Router::add_controller`].
//!
//! `params` holds one entry per `{placeholder}` of the template, in
//! left-to-right order. Placeholder names are not kept.
//!
//! Both end up behind the same trait object so the router can store them in
//! one table:
//!
//! ```text
//! fn show_user(req, params) -> …             ← user writes this
//!        ↓ router.on(Method::Get, "/user/{id}", show_user)
//! show_user.into_boxed_handler()             ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(show_user))             ← stored as BoxedHandler
//!        ↓
//! handler.call(&req, &params)  per request   ← one vtable dispatch
//! ```
//!
//! [`Router::on`]: crate::Router::on
//! [`Router::add_controller`]: crate::Router::add_controller

use std::sync::Arc;

use crate::error::ApiError;
use crate::method::Method;
use crate::reply::{IntoReply, Reply};
use crate::request::Request;
use crate::status::Status;

// ── Internal types ────────────────────────────────────────────────────────────

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` because it appears in the return type of
/// `Handler::into_boxed_handler`.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: &Request, params: &[String]) -> Result<Reply, ApiError>;
}

#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Handler ───────────────────────────────────────────────────────────────────

/// Implemented for every function usable as a route handler. Sealed; you
/// never implement it yourself.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, R> private::Sealed for F
where
    F: Fn(&Request, &[String]) -> Result<R, ApiError> + Send + Sync + 'static,
    R: IntoReply,
{
}

impl<F, R> Handler for F
where
    F: Fn(&Request, &[String]) -> Result<R, ApiError> + Send + Sync + 'static,
    R: IntoReply,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

struct FnHandler<F>(F);

impl<F, R> ErasedHandler for FnHandler<F>
where
    F: Fn(&Request, &[String]) -> Result<R, ApiError>,
    R: IntoReply,
{
    fn call(&self, req: &Request, params: &[String]) -> Result<Reply, ApiError> {
        (self.0)(req, params).map(IntoReply::into_reply)
    }
}

// ── Controller ────────────────────────────────────────────────────────────────

/// A handler that declares where it is mounted.
///
/// ```rust
/// use donner::{ApiError, Controller, Method, Reply, Request, Router, Status};
///
/// struct ShowUser;
///
/// impl Controller for ShowUser {
///     fn uri(&self) -> &str { "/user/{id}" }
///     fn method(&self) -> Method { Method::Get }
///
///     fn handle(&self, _req: &Request, params: &[String]) -> Result<Reply, ApiError> {
///         let id: u64 = params[0].parse().map_err(|_| ApiError::new("Invalid user ID"))?;
///         Reply::json(Status::Ok, &serde_json::json!({ "id": id }))
///     }
/// }
///
/// let router = Router::new().add_controller(ShowUser);
/// assert_eq!(router.run(Request::new("GET", "/user/9")).body(), br#"{"id":9}"#);
/// ```
pub trait Controller: Send + Sync + 'static {
    /// URI template with `{name}` placeholders.
    fn uri(&self) -> &str;

    fn method(&self) -> Method {
        Method::All
    }

    fn handle(&self, req: &Request, params: &[String]) -> Result<Reply, ApiError>;
}

pub(crate) struct ControllerHandler<C>(pub(crate) C);

impl<C: Controller> ErasedHandler for ControllerHandler<C> {
    fn call(&self, req: &Request, params: &[String]) -> Result<Reply, ApiError> {
        self.0.handle(req, params)
    }
}

// ── Not found ─────────────────────────────────────────────────────────────────

/// Default fallback: `404` with body `Not found`.
pub fn not_found(_req: &Request, _params: &[String]) -> Result<Reply, ApiError> {
    Ok(Reply::text(Status::NotFound, "Not found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo(_req: &Request, params: &[String]) -> Result<String, ApiError> {
        Ok(params.join(","))
    }

    #[test]
    fn fn_handlers_are_erased() {
        let handler = echo.into_boxed_handler();
        let reply = handler.call(&Request::new("GET", "/"), &["a".to_owned(), "b".to_owned()]).unwrap();
        assert_eq!(reply, Reply::text(Status::Ok, "a,b"));
    }

    #[test]
    fn not_found_is_404() {
        let reply = not_found(&Request::new("GET", "/nope"), &[]).unwrap();
        assert_eq!(reply.status(), Status::NotFound);
    }
}
