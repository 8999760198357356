//! Route registration key.
//!
//! A handler is bound to exactly one of `GET`, `POST` or `ALL`. Inbound
//! requests with any other method can still reach handlers registered under
//! `ALL`; `OPTIONS` never reaches a handler at all.

use std::fmt;
use std::str::FromStr;

/// The method a handler accepts.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    Get,
    Post,
    /// Matches any inbound method, and is the fallback bucket for all of them.
    All,
}

impl Method {
    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get  => "GET",
            Self::Post => "POST",
            Self::All  => "ALL",
        }
    }
}

/// Parses an uppercase method string. Case-sensitive per RFC 9110 §9.1.
impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET"  => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "ALL"  => Ok(Self::All),
            _      => Err(()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_registration_keys() {
        assert_eq!("GET".parse::<Method>(), Ok(Method::Get));
        assert_eq!("POST".parse::<Method>(), Ok(Method::Post));
        assert_eq!("ALL".parse::<Method>(), Ok(Method::All));
        assert_eq!("get".parse::<Method>(), Err(()));
        assert_eq!("PUT".parse::<Method>(), Err(()));
    }
}
