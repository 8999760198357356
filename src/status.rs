//! HTTP status codes as a typed enum.
//!
//! Every reply resolves to exactly one [`Status`] before it is written.
//! Lookups by numeric code or by constant name fail with
//! [`Error::UnknownStatus`] / [`Error::UnknownStatusName`] instead of
//! producing an arbitrary number.
//!
//! ```rust
//! use donner::Status;
//!
//! assert_eq!(Status::BadRequest.code(), 400);
//! assert_eq!(Status::from_code(404).unwrap(), Status::NotFound);
//! assert_eq!(Status::from_name("SERVICE_UNAVAILABLE").unwrap(), Status::ServiceUnavailable);
//! assert!(Status::from_code(299).is_err());
//! ```

use std::fmt;

use crate::error::Error;

macro_rules! statuses {
    ($( $variant:ident = $code:literal, $name:literal, $reason:literal; )+) => {
        /// A registered HTTP status code.
        #[allow(clippy::enum_variant_names)]
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub enum Status {
            $( $variant, )+
        }

        impl Status {
            /// Numeric code, e.g. `404`.
            pub fn code(self) -> u16 {
                match self {
                    $( Self::$variant => $code, )+
                }
            }

            /// Constant-style name, e.g. `"NOT_FOUND"`.
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $name, )+
                }
            }

            /// Reason phrase for the status line, e.g. `"Not Found"`.
            pub fn reason(self) -> &'static str {
                match self {
                    $( Self::$variant => $reason, )+
                }
            }

            pub fn from_code(code: u16) -> Result<Self, Error> {
                match code {
                    $( $code => Ok(Self::$variant), )+
                    other => Err(Error::UnknownStatus(other)),
                }
            }

            pub fn from_name(name: &str) -> Result<Self, Error> {
                match name {
                    $( $name => Ok(Self::$variant), )+
                    other => Err(Error::UnknownStatusName(other.to_owned())),
                }
            }
        }
    };
}

statuses! {
    // ── 1xx Informational ─────────────────────────────────────────────────────
    Continue                      = 100, "CONTINUE",                        "Continue";
    SwitchingProtocols            = 101, "SWITCHING_PROTOCOLS",             "Switching Protocols";
    Processing                    = 102, "PROCESSING",                      "Processing";
    EarlyHints                    = 103, "EARLY_HINTS",                     "Early Hints";

    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok                            = 200, "OK",                              "OK";
    Created                       = 201, "CREATED",                         "Created";
    Accepted                      = 202, "ACCEPTED",                        "Accepted";
    NonAuthoritativeInformation   = 203, "NON_AUTHORITATIVE_INFORMATION",   "Non-Authoritative Information";
    NoContent                     = 204, "NO_CONTENT",                      "No Content";
    ResetContent                  = 205, "RESET_CONTENT",                   "Reset Content";
    PartialContent                = 206, "PARTIAL_CONTENT",                 "Partial Content";

    // ── 3xx Redirection ───────────────────────────────────────────────────────
    MultipleChoices               = 300, "MULTIPLE_CHOICES",                "Multiple Choices";
    MovedPermanently              = 301, "MOVED_PERMANENTLY",               "Moved Permanently";
    Found                         = 302, "FOUND",                           "Found";
    SeeOther                      = 303, "SEE_OTHER",                       "See Other";
    NotModified                   = 304, "NOT_MODIFIED",                    "Not Modified";
    UseProxy                      = 305, "USE_PROXY",                       "Use Proxy";
    TemporaryRedirect             = 307, "TEMPORARY_REDIRECT",              "Temporary Redirect";
    PermanentRedirect             = 308, "PERMANENT_REDIRECT",              "Permanent Redirect";

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest                    = 400, "BAD_REQUEST",                     "Bad Request";
    Unauthorized                  = 401, "UNAUTHORIZED",                    "Unauthorized";
    PaymentRequired               = 402, "PAYMENT_REQUIRED",                "Payment Required";
    Forbidden                     = 403, "FORBIDDEN",                       "Forbidden";
    NotFound                      = 404, "NOT_FOUND",                       "Not Found";
    MethodNotAllowed              = 405, "METHOD_NOT_ALLOWED",              "Method Not Allowed";
    NotAcceptable                 = 406, "NOT_ACCEPTABLE",                  "Not Acceptable";
    ProxyAuthenticationRequired   = 407, "PROXY_AUTHENTICATION_REQUIRED",   "Proxy Authentication Required";
    RequestTimeout                = 408, "REQUEST_TIMEOUT",                 "Request Timeout";
    Conflict                      = 409, "CONFLICT",                        "Conflict";
    Gone                          = 410, "GONE",                            "Gone";
    LengthRequired                = 411, "LENGTH_REQUIRED",                 "Length Required";
    PreconditionFailed            = 412, "PRECONDITION_FAILED",             "Precondition Failed";
    ContentTooLarge               = 413, "CONTENT_TOO_LARGE",               "Content Too Large";
    UriTooLong                    = 414, "URI_TOO_LONG",                    "URI Too Long";
    UnsupportedMediaType          = 415, "UNSUPPORTED_MEDIA_TYPE",          "Unsupported Media Type";
    RangeNotSatisfiable           = 416, "RANGE_NOT_SATISFIABLE",           "Range Not Satisfiable";
    ExpectationFailed             = 417, "EXPECTATION_FAILED",              "Expectation Failed";
    UnprocessableContent          = 422, "UNPROCESSABLE_CONTENT",           "Unprocessable Content";
    TooManyRequests               = 429, "TOO_MANY_REQUESTS",               "Too Many Requests";

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError           = 500, "INTERNAL_SERVER_ERROR",           "Internal Server Error";
    NotImplemented                = 501, "NOT_IMPLEMENTED",                 "Not Implemented";
    BadGateway                    = 502, "BAD_GATEWAY",                     "Bad Gateway";
    ServiceUnavailable            = 503, "SERVICE_UNAVAILABLE",             "Service Unavailable";
    GatewayTimeout                = 504, "GATEWAY_TIMEOUT",                 "Gateway Timeout";
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        s.code()
    }
}

impl TryFrom<u16> for Status {
    type Error = Error;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_the_standard_ranges() {
        for code in [100, 101, 200, 201, 202, 203, 204, 205, 206] {
            assert_eq!(Status::from_code(code).unwrap().code(), code);
        }
        for code in [300, 301, 302, 303, 304, 305, 307] {
            assert_eq!(Status::from_code(code).unwrap().code(), code);
        }
        for code in 400..=417 {
            assert_eq!(Status::from_code(code).unwrap().code(), code);
        }
        for code in [500, 501, 503] {
            assert_eq!(Status::from_code(code).unwrap().code(), code);
        }
    }

    #[test]
    fn unknown_code_is_an_error() {
        assert!(matches!(Status::from_code(299), Err(Error::UnknownStatus(299))));
        assert!(matches!(Status::try_from(999u16), Err(Error::UnknownStatus(999))));
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(Status::from_name("BAD_REQUEST").unwrap(), Status::BadRequest);
        assert_eq!(Status::NotFound.name(), "NOT_FOUND");
        assert!(matches!(
            Status::from_name("bad_request"),
            Err(Error::UnknownStatusName(name)) if name == "bad_request"
        ));
    }

    #[test]
    fn display_is_status_line_fragment() {
        assert_eq!(Status::Found.to_string(), "302 Found");
        assert_eq!(u16::from(Status::Ok), 200);
    }
}
