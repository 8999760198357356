//! Handler return values and how they turn into responses.
//!
//! A handler returns anything that is [`IntoReply`]. Each [`Reply`] variant
//! carries its own [`Status`] and knows how to build its body:
//!
//! | Variant              | Body |
//! |----------------------|------|
//! | [`Reply::Generic`]   | the wrapped value verbatim (JSON or string) |
//! | [`Reply::Success`]   | `{"success": bool}` |
//! | [`Reply::Items`]     | `{"items": […], "total_count": n, "previous_cursor"?, "next_cursor"?}` |
//! | [`Reply::Redirect`]  | none; `Location` header |
//!
//! Structured bodies go through [`structure`], which drops `null` fields and
//! fields whose name starts with `_`, recursively.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::response::Response;
use crate::status::Status;

/// Serializes `data` and strips `null` values and `_`-prefixed keys from
/// every object, at any depth. Field order is kept.
///
/// ```rust
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct User { id: u32, nickname: Option<String>, _hash: String }
///
/// let user = User { id: 7, nickname: None, _hash: "x".into() };
/// assert_eq!(donner::structure(&user).unwrap(), serde_json::json!({ "id": 7 }));
/// ```
pub fn structure<T: Serialize + ?Sized>(data: &T) -> Result<Value, ApiError> {
    serde_json::to_value(data).map(prune).map_err(serialize_error)
}

fn prune(value: Value) -> Value {
    match value {
        Value::Object(fields) => Value::Object(
            fields.into_iter()
                .filter(|(k, v)| !k.starts_with('_') && !v.is_null())
                .map(|(k, v)| (k, prune(v)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(prune).collect()),
        other => other,
    }
}

fn serialize_error(e: serde_json::Error) -> ApiError {
    ApiError::new(format!("response serialization failed: {e}"))
        .with_status(Status::InternalServerError)
}

// ── Variants ──────────────────────────────────────────────────────────────────

/// Body of a [`Generic`] reply.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    Json(Value),
    Text(String),
}

/// Any value, passed through untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct Generic {
    pub status: Status,
    pub body: Body,
}

/// `{"success": bool}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Success {
    #[serde(skip)]
    pub status: Status,
    pub success: bool,
}

impl Default for Success {
    fn default() -> Self {
        Self { status: Status::Ok, success: true }
    }
}

/// One page of rows plus paging cursors.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Items {
    #[serde(skip)]
    pub status: Status,
    pub items: Vec<Value>,
    pub total_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl Items {
    /// Each row is passed through [`structure`].
    pub fn new<T: Serialize>(rows: impl IntoIterator<Item = T>, total_count: u64) -> Result<Self, ApiError> {
        let items = rows.into_iter()
            .map(|row| structure(&row))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { status: Status::Ok, items, total_count, previous_cursor: None, next_cursor: None })
    }

    pub fn previous_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.previous_cursor = Some(cursor.into());
        self
    }

    pub fn next_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.next_cursor = Some(cursor.into());
        self
    }
}

/// A redirect to `target`, with `query` appended on render.
///
/// The fields are public, so the target is checked again when the reply is
/// rendered.
#[derive(Clone, Debug, PartialEq)]
pub struct Redirect {
    pub status: Status,
    pub target: String,
    pub query: Vec<(String, String)>,
}

impl Redirect {
    /// `302 Found`. Fails on an empty target.
    pub fn new(target: impl Into<String>) -> Result<Self, ApiError> {
        let target = target.into();
        if target.is_empty() {
            return Err(empty_redirect());
        }
        Ok(Self { status: Status::Found, target, query: Vec::new() })
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// The final `Location` value.
    pub fn location(&self) -> Result<String, ApiError> {
        if self.target.is_empty() {
            return Err(empty_redirect());
        }
        if self.query.is_empty() {
            return Ok(self.target.clone());
        }
        let separator = if self.target.contains('?') { '&' } else { '?' };
        let query = self.query.iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        Ok(format!("{}{separator}{query}", self.target))
    }
}

fn empty_redirect() -> ApiError {
    ApiError::new("redirect target is empty").with_status(Status::InternalServerError)
}

// ── Reply ─────────────────────────────────────────────────────────────────────

/// What a handler produced.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    Generic(Generic),
    Success(Success),
    Items(Items),
    Redirect(Redirect),
}

impl Reply {
    /// Generic reply with `data` serialized verbatim.
    pub fn json<T: Serialize + ?Sized>(status: Status, data: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(data).map_err(serialize_error)?;
        Ok(Self::Generic(Generic { status, body: Body::Json(value) }))
    }

    /// Generic reply with `data` passed through [`structure`].
    pub fn object<T: Serialize + ?Sized>(status: Status, data: &T) -> Result<Self, ApiError> {
        Ok(Self::Generic(Generic { status, body: Body::Json(structure(data)?) }))
    }

    pub fn text(status: Status, body: impl Into<String>) -> Self {
        Self::Generic(Generic { status, body: Body::Text(body.into()) })
    }

    pub fn success(success: bool) -> Self {
        Self::Success(Success { success, ..Success::default() })
    }

    pub fn items<T: Serialize>(rows: impl IntoIterator<Item = T>, total_count: u64) -> Result<Self, ApiError> {
        Items::new(rows, total_count).map(Self::Items)
    }

    pub fn redirect(target: impl Into<String>) -> Result<Self, ApiError> {
        Redirect::new(target).map(Self::Redirect)
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Generic(r)  => r.status,
            Self::Success(r)  => r.status,
            Self::Items(r)    => r.status,
            Self::Redirect(r) => r.status,
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        match &mut self {
            Self::Generic(r)  => r.status = status,
            Self::Success(r)  => r.status = status,
            Self::Items(r)    => r.status = status,
            Self::Redirect(r) => r.status = status,
        }
        self
    }

    /// Structured bodies become JSON; string bodies are written verbatim.
    pub fn render(self) -> Result<Response, ApiError> {
        let status = self.status();
        let body = match self {
            Self::Generic(Generic { body, .. }) => body,
            Self::Success(r) => Body::Json(structure(&r)?),
            Self::Items(r) => Body::Json(structure(&r)?),
            Self::Redirect(r) => {
                let location = r.location()?;
                return Ok(Response::builder()
                    .status(status)
                    .header("location", &location)
                    .no_body());
            }
        };
        let builder = Response::builder().status(status);
        Ok(match body {
            Body::Json(value) => builder.json(serde_json::to_vec(&value).unwrap_or_default()),
            Body::Text(text) => builder.html(text),
        })
    }
}

// ── IntoReply ─────────────────────────────────────────────────────────────────

/// Conversion into a [`Reply`]. Implement on your own types to return them
/// directly from handlers.
pub trait IntoReply {
    fn into_reply(self) -> Reply;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Reply { self }
}

impl IntoReply for Generic {
    fn into_reply(self) -> Reply { Reply::Generic(self) }
}

impl IntoReply for Success {
    fn into_reply(self) -> Reply { Reply::Success(self) }
}

impl IntoReply for Items {
    fn into_reply(self) -> Reply { Reply::Items(self) }
}

impl IntoReply for Redirect {
    fn into_reply(self) -> Reply { Reply::Redirect(self) }
}

impl IntoReply for Value {
    fn into_reply(self) -> Reply {
        Reply::Generic(Generic { status: Status::Ok, body: Body::Json(self) })
    }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Reply { Reply::text(Status::Ok, self) }
}

impl IntoReply for String {
    fn into_reply(self) -> Reply { Reply::text(Status::Ok, self) }
}

/// Return a [`Status`] directly from a handler: empty string body.
impl IntoReply for Status {
    fn into_reply(self) -> Reply { Reply::text(self, "") }
}
