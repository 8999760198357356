//! # donner
//!
//! A small request router: URI templates with positional parameters,
//! chained input validation, and replies rendered to JSON or redirects.
//!
//! ## The pipeline
//!
//! ```text
//! Request ─▶ Router::run ─▶ pattern match ─▶ handler(&Request, &[params])
//!                                              │  req.get("page").as_int(..)?
//!                                              ▼
//!                          Response ◀─ render ◀─ Reply  (or ApiError)
//! ```
//!
//! - Templates like `/user/{id}/post/{postId}` hand the handler
//!   `["42", "7"]`, in template order.
//! - Validators return [`ApiError`], so `?` carries a failure straight to
//!   the router, which renders it once as
//!   `{"error":{"code":…,"message":…}}` with the error's status.
//! - `OPTIONS` is answered with `200 ok` before routing.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use donner::{ApiError, Method, Reply, Request, Router, Server, Status};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .on(Method::Get, "/status",    status)
//!         .on(Method::Get, "/user/{id}", show_user);
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! fn status(_req: &Request, _params: &[String]) -> Result<Reply, ApiError> {
//!     Reply::json(Status::Ok, &json!({ "status": "online" }))
//! }
//!
//! fn show_user(req: &Request, params: &[String]) -> Result<Reply, ApiError> {
//!     let id: u64 = params[0].parse().map_err(|_| ApiError::new("Invalid user ID"))?;
//!     let verbose = req.get("verbose").as_bool();
//!     Reply::json(Status::Ok, &json!({ "id": id, "verbose": verbose }))
//! }
//! ```
//!
//! The bundled [`Server`] is one possible transport. Anything that can build
//! a [`Request`] and write a [`Response`] can drive a [`Router`].

mod error;
mod file;
mod form;
mod handler;
mod method;
mod param;
mod reply;
mod request;
mod response;
mod router;
mod server;
mod sniff;
mod status;

pub use error::{ApiError, Error, INVALID_REQUEST};
pub use file::{FileParam, UploadFile};
pub use handler::{Controller, Handler, not_found};
pub use method::Method;
pub use param::Param;
pub use reply::{Body, Generic, IntoReply, Items, Redirect, Reply, Success, structure};
pub use request::{FileDescriptor, Input, Request};
pub use response::{ContentType, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use status::Status;
