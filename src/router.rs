//! Regex-template request router.
//!
//! A URI template such as `/user/{id}/post/{postId}` compiles to
//! `^/user/(.+?)/post/(.+?)$`. A match yields one parameter per capture
//! group, in template order, with surrounding `/` trimmed. Names are dropped.
//!
//! Routes live in one bucket per [`Method`]. Within a bucket, patterns are
//! tried in registration order and the first full match wins. When the
//! bucket for the inbound method has no match, the `ALL` bucket is tried
//! next, and then the not-found handler.
//!
//! Registering a second handler whose template compiles to the same pattern
//! in the same bucket replaces the first one; it keeps the first one's place
//! in the order.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::handler::{BoxedHandler, Controller, ControllerHandler, Handler, not_found};
use crate::method::Method;
use crate::reply::Reply;
use crate::request::Request;
use crate::response::Response;

/// One compiled route.
struct Route {
    pattern: Regex,
    handler: BoxedHandler,
}

/// The application router.
///
/// Build it once at startup; it is read-only while serving. Each
/// registration returns `self` so calls chain.
pub struct Router {
    routes: HashMap<Method, IndexMap<String, Route>>,
    not_found: BoxedHandler,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), not_found: not_found.into_boxed_handler() }
    }

    /// Register a handler for a method + URI template pair.
    ///
    /// ```rust
    /// # use donner::{ApiError, Method, Request, Router};
    /// fn show_post(_: &Request, p: &[String]) -> Result<String, ApiError> {
    ///     Ok(format!("user {} post {}", p[0], p[1]))
    /// }
    ///
    /// let router = Router::new().on(Method::Get, "/user/{id}/post/{postId}", show_post);
    /// let resp = router.run(Request::new("GET", "/user/42/post/7"));
    /// assert_eq!(resp.body(), b"user 42 post 7");
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the compiled pattern exceeds the regex engine's size limit.
    pub fn on(self, method: Method, uri: &str, handler: impl Handler) -> Self {
        self.add(method, uri, handler.into_boxed_handler())
    }

    /// Register a [`Controller`] under its own template and method.
    pub fn add_controller(self, controller: impl Controller) -> Self {
        let method = controller.method();
        let uri = controller.uri().to_owned();
        self.add(method, &uri, Arc::new(ControllerHandler(controller)))
    }

    /// Replace the handler used when nothing matches.
    pub fn not_found(mut self, handler: impl Handler) -> Self {
        self.not_found = handler.into_boxed_handler();
        self
    }

    fn add(mut self, method: Method, uri: &str, handler: BoxedHandler) -> Self {
        let source = compile_template(uri);
        let pattern = Regex::new(&source)
            .unwrap_or_else(|e| panic!("invalid route `{uri}`: {e}"));
        let bucket = self.routes.entry(method).or_default();
        if bucket.insert(source, Route { pattern, handler }).is_some() {
            warn!(%method, uri, "route replaced an earlier registration with the same pattern");
        }
        self
    }

    /// Routes one request and renders the result.
    ///
    /// `OPTIONS` requests are answered with `200 ok` before any lookup. An
    /// [`ApiError`] from a handler or from rendering becomes an error
    /// response; nothing else is caught here.
    pub fn run(&self, req: Request) -> Response {
        if req.method() == "OPTIONS" {
            return Response::html("ok");
        }
        match self.dispatch(&req).and_then(Reply::render) {
            Ok(resp) => resp,
            Err(e) => {
                warn!(method = req.method(), path = req.path(), code = e.code, status = %e.status, "{}", e.message);
                e.into_response()
            }
        }
    }

    fn dispatch(&self, req: &Request) -> Result<Reply, ApiError> {
        let method = req.method().parse::<Method>().ok();

        if let Some(found) = method.and_then(|m| self.find(m, req)) {
            return found;
        }
        if method != Some(Method::All) {
            if let Some(found) = self.find(Method::All, req) {
                return found;
            }
        }

        debug!(method = req.method(), path = req.path(), "no route, using not-found handler");
        self.not_found.call(req, &[])
    }

    /// Runs the first route in `method`'s bucket that matches the path.
    fn find(&self, method: Method, req: &Request) -> Option<Result<Reply, ApiError>> {
        let path = req.path();
        let (source, route, params) = self.routes.get(&method)?
            .iter()
            .find_map(|(source, route)| capture(&route.pattern, path).map(|p| (source, route, p)))?;
        debug!(bucket = %method, path, pattern = %source, "route matched");
        Some(route.handler.call(req, &params))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

/// Translates `{name}` placeholders into lazy capture groups and escapes the
/// literal text around them.
pub(crate) fn compile_template(uri: &str) -> String {
    let mut source = String::from("^");
    let mut rest = uri;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}') else { break };
        source.push_str(&regex::escape(&rest[..open]));
        source.push_str("(.+?)");
        rest = &rest[open + close + 1..];
    }
    source.push_str(&regex::escape(rest));
    source.push('$');
    source
}

/// Positional parameters, or `None` when `path` does not match.
fn capture(pattern: &Regex, path: &str) -> Option<Vec<String>> {
    let caps = pattern.captures(path)?;
    Some(
        caps.iter()
            .skip(1)
            .map(|m| m.map_or("", |m| m.as_str()).trim_matches('/').to_owned())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_placeholders_to_lazy_groups() {
        assert_eq!(compile_template("/status"), "^/status$");
        assert_eq!(compile_template("/user/{id}"), "^/user/(.+?)$");
        assert_eq!(compile_template("/user/{id}/post/{postId}"), "^/user/(.+?)/post/(.+?)$");
        assert_eq!(compile_template("/file.{ext}"), r"^/file\.(.+?)$");
    }

    #[test]
    fn same_shape_compiles_identically() {
        assert_eq!(compile_template("/user/{id}"), compile_template("/user/{name}"));
    }

    #[test]
    fn unclosed_brace_is_literal() {
        assert_eq!(compile_template("/a/{b"), r"^/a/\{b$");
    }

    #[test]
    fn captures_are_positional_and_trimmed() {
        let re = Regex::new(&compile_template("/user/{id}/post/{postId}")).unwrap();
        assert_eq!(capture(&re, "/user/42/post/7").unwrap(), ["42", "7"]);
        assert!(capture(&re, "/user/42").is_none());

        let re = Regex::new(&compile_template("/files/{path}")).unwrap();
        assert_eq!(capture(&re, "/files/a/b/").unwrap(), ["a/b"]);
    }

    #[test]
    fn match_is_anchored() {
        let re = Regex::new(&compile_template("/status")).unwrap();
        assert!(capture(&re, "/status/extra").is_none());
        assert!(capture(&re, "/api/status").is_none());
        assert!(capture(&re, "/status").unwrap().is_empty());
    }
}
