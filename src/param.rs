//! Chainable validation of a single request parameter.
//!
//! ```rust
//! use donner::{ApiError, Request};
//!
//! fn page(req: &Request) -> Result<i64, ApiError> {
//!     req.get("page").default_value(1).as_positive_int("Invalid page", 3)
//! }
//!
//! assert_eq!(page(&Request::new("GET", "/")).unwrap(), 1);
//! assert_eq!(page(&Request::new("GET", "/").with_param("page", "4")).unwrap(), 4);
//! ```
//!
//! A value is *present* whenever the key exists, including `""` and `"0"`.
//! Coercions that cannot use the present value fall back to the default
//! unless [`Param::required`] was called, in which case they fail.

use crate::error::ApiError;

const TRUTHY: &[&str] = &["1", "true", "yes", "on", "y"];

/// Validator around one raw parameter value.
#[derive(Clone, Debug)]
pub struct Param {
    name: String,
    value: Option<String>,
    default: Option<String>,
    required: bool,
}

impl Param {
    pub fn new(name: impl Into<String>, value: Option<String>) -> Self {
        Self { name: name.into(), value, default: None, required: false }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn raw(&self) -> Option<&str> { self.value.as_deref() }
    pub fn is_required(&self) -> bool { self.required }

    /// Fallback for absent or unusable values on a non-required parameter.
    /// Stored as given; each coercion converts it on use.
    pub fn default_value(mut self, value: impl ToString) -> Self {
        self.default = Some(value.to_string());
        self
    }

    /// Fails when the value is absent, otherwise marks the parameter as
    /// required for the coercions that follow.
    pub fn required(mut self, message: impl Into<String>, code: i64) -> Result<Self, ApiError> {
        if self.value.is_none() {
            return Err(ApiError::invalid(message, code));
        }
        self.required = true;
        Ok(self)
    }

    pub fn as_int(&self, message: impl Into<String>, code: i64) -> Result<i64, ApiError> {
        match self.value.as_deref().and_then(parse_int) {
            Some(n) => Ok(n),
            None if self.required => Err(ApiError::invalid(message, code)),
            None => Ok(self.default_int()),
        }
    }

    pub fn as_string(&self, message: impl Into<String>, code: i64) -> Result<String, ApiError> {
        match &self.value {
            Some(v) => Ok(v.clone()),
            None if self.required => Err(ApiError::invalid(message, code)),
            None => Ok(self.default.clone().unwrap_or_default()),
        }
    }

    /// Like [`as_int`](Self::as_int) but rejects negatives. Zero passes.
    pub fn as_positive_int(&self, message: impl Into<String>, code: i64) -> Result<i64, ApiError> {
        let message = message.into();
        let n = self.as_int(message.clone(), code)?;
        if n >= 0 {
            Ok(n)
        } else if self.required {
            Err(ApiError::invalid(message, code))
        } else {
            Ok(self.default_int())
        }
    }

    /// `"1"`, `"true"`, `"yes"`, `"on"` and `"y"` (any case) are true;
    /// everything else, including an absent value with no default, is false.
    pub fn as_bool(&self) -> bool {
        self.value.as_deref()
            .or(self.default.as_deref())
            .is_some_and(is_truthy)
    }

    /// Comma-separated integers, keeping only tokens greater than zero.
    /// An empty result fails only on a required parameter.
    pub fn as_positive_int_list(&self, message: impl Into<String>, code: i64) -> Result<Vec<i64>, ApiError> {
        let list: Vec<i64> = self.value.as_deref()
            .or(self.default.as_deref())
            .map(|raw| {
                raw.split(',')
                    .filter_map(parse_int)
                    .filter(|n| *n > 0)
                    .collect()
            })
            .unwrap_or_default();

        if list.is_empty() && self.required {
            return Err(ApiError::invalid(message, code));
        }
        Ok(list)
    }

    /// A present value must equal one of `allowed` exactly. An absent value on
    /// a non-required parameter yields the default *without* checking it
    /// against `allowed`.
    pub fn as_enum(&self, allowed: &[&str], message: impl Into<String>, code: i64) -> Result<String, ApiError> {
        match self.value.as_deref() {
            Some(v) if allowed.contains(&v) => Ok(v.to_owned()),
            Some(_) => Err(ApiError::invalid(message, code)),
            None if self.required => Err(ApiError::invalid(message, code)),
            None => Ok(self.default.clone().unwrap_or_default()),
        }
    }

    fn default_int(&self) -> i64 {
        self.default.as_deref().and_then(parse_int).unwrap_or(0)
    }
}

fn parse_int(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

fn is_truthy(raw: &str) -> bool {
    let raw = raw.trim();
    TRUTHY.iter().any(|t| raw.eq_ignore_ascii_case(t))
}
