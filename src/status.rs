//! HTTP status codes as a typed enum.
//!
//! Endpoint callbacks pick a status by name, the way API clients read it:
//!
//! ```rust
//! use apier::Status;
//!
//! let created: Status = "CREATED".parse().unwrap();
//! assert_eq!(created, Status::Created);
//! assert_eq!(created.code(), 201);
//! assert_eq!("201".parse::<Status>(), Ok(Status::Created));
//! ```

use std::fmt;
use std::str::FromStr;

/// The HTTP statuses an API endpoint commonly answers with.
#[allow(clippy::enum_variant_names)]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Status {
    // ── 2xx Success ───────────────────────────────────────────────────────────
    #[default]
    Ok,                   // 200
    Created,              // 201
    Accepted,             // 202
    NoContent,            // 204

    // ── 3xx Redirection ───────────────────────────────────────────────────────
    MovedPermanently,     // 301
    Found,                // 302
    SeeOther,             // 303
    NotModified,          // 304
    TemporaryRedirect,    // 307
    PermanentRedirect,    // 308

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest,           // 400
    Unauthorized,         // 401
    Forbidden,            // 403
    NotFound,             // 404
    MethodNotAllowed,     // 405
    NotAcceptable,        // 406
    RequestTimeout,       // 408
    Conflict,             // 409
    Gone,                 // 410
    PreconditionFailed,   // 412
    ContentTooLarge,      // 413
    UnsupportedMediaType, // 415
    UnprocessableContent, // 422
    TooManyRequests,      // 429

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError,  // 500
    NotImplemented,       // 501
    BadGateway,           // 502
    ServiceUnavailable,   // 503
    GatewayTimeout,       // 504
}

impl Status {
    const ALL: [Status; 29] = [
        Self::Ok, Self::Created, Self::Accepted, Self::NoContent,
        Self::MovedPermanently, Self::Found, Self::SeeOther, Self::NotModified,
        Self::TemporaryRedirect, Self::PermanentRedirect,
        Self::BadRequest, Self::Unauthorized, Self::Forbidden, Self::NotFound,
        Self::MethodNotAllowed, Self::NotAcceptable, Self::RequestTimeout,
        Self::Conflict, Self::Gone, Self::PreconditionFailed, Self::ContentTooLarge,
        Self::UnsupportedMediaType, Self::UnprocessableContent, Self::TooManyRequests,
        Self::InternalServerError, Self::NotImplemented, Self::BadGateway,
        Self::ServiceUnavailable, Self::GatewayTimeout,
    ];

    /// Numeric code, e.g. `201`.
    pub fn code(self) -> u16 {
        match self {
            Self::Ok                   => 200,
            Self::Created              => 201,
            Self::Accepted             => 202,
            Self::NoContent            => 204,
            Self::MovedPermanently     => 301,
            Self::Found                => 302,
            Self::SeeOther             => 303,
            Self::NotModified          => 304,
            Self::TemporaryRedirect    => 307,
            Self::PermanentRedirect    => 308,
            Self::BadRequest           => 400,
            Self::Unauthorized         => 401,
            Self::Forbidden            => 403,
            Self::NotFound             => 404,
            Self::MethodNotAllowed     => 405,
            Self::NotAcceptable        => 406,
            Self::RequestTimeout       => 408,
            Self::Conflict             => 409,
            Self::Gone                 => 410,
            Self::PreconditionFailed   => 412,
            Self::ContentTooLarge      => 413,
            Self::UnsupportedMediaType => 415,
            Self::UnprocessableContent => 422,
            Self::TooManyRequests      => 429,
            Self::InternalServerError  => 500,
            Self::NotImplemented       => 501,
            Self::BadGateway           => 502,
            Self::ServiceUnavailable   => 503,
            Self::GatewayTimeout       => 504,
        }
    }

    /// Upper snake-case name, e.g. `"CREATED"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Ok                   => "OK",
            Self::Created              => "CREATED",
            Self::Accepted             => "ACCEPTED",
            Self::NoContent            => "NO_CONTENT",
            Self::MovedPermanently     => "MOVED_PERMANENTLY",
            Self::Found                => "FOUND",
            Self::SeeOther             => "SEE_OTHER",
            Self::NotModified          => "NOT_MODIFIED",
            Self::TemporaryRedirect    => "TEMPORARY_REDIRECT",
            Self::PermanentRedirect    => "PERMANENT_REDIRECT",
            Self::BadRequest           => "BAD_REQUEST",
            Self::Unauthorized         => "UNAUTHORIZED",
            Self::Forbidden            => "FORBIDDEN",
            Self::NotFound             => "NOT_FOUND",
            Self::MethodNotAllowed     => "METHOD_NOT_ALLOWED",
            Self::NotAcceptable        => "NOT_ACCEPTABLE",
            Self::RequestTimeout       => "REQUEST_TIMEOUT",
            Self::Conflict             => "CONFLICT",
            Self::Gone                 => "GONE",
            Self::PreconditionFailed   => "PRECONDITION_FAILED",
            Self::ContentTooLarge      => "CONTENT_TOO_LARGE",
            Self::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
            Self::UnprocessableContent => "UNPROCESSABLE_CONTENT",
            Self::TooManyRequests      => "TOO_MANY_REQUESTS",
            Self::InternalServerError  => "INTERNAL_SERVER_ERROR",
            Self::NotImplemented       => "NOT_IMPLEMENTED",
            Self::BadGateway           => "BAD_GATEWAY",
            Self::ServiceUnavailable   => "SERVICE_UNAVAILABLE",
            Self::GatewayTimeout       => "GATEWAY_TIMEOUT",
        }
    }

    /// Reason phrase, e.g. `"Created"`.
    pub fn reason(self) -> &'static str {
        match self {
            Self::Ok                   => "OK",
            Self::Created              => "Created",
            Self::Accepted             => "Accepted",
            Self::NoContent            => "No Content",
            Self::MovedPermanently     => "Moved Permanently",
            Self::Found                => "Found",
            Self::SeeOther             => "See Other",
            Self::NotModified          => "Not Modified",
            Self::TemporaryRedirect    => "Temporary Redirect",
            Self::PermanentRedirect    => "Permanent Redirect",
            Self::BadRequest           => "Bad Request",
            Self::Unauthorized         => "Unauthorized",
            Self::Forbidden            => "Forbidden",
            Self::NotFound             => "Not Found",
            Self::MethodNotAllowed     => "Method Not Allowed",
            Self::NotAcceptable        => "Not Acceptable",
            Self::RequestTimeout       => "Request Timeout",
            Self::Conflict             => "Conflict",
            Self::Gone                 => "Gone",
            Self::PreconditionFailed   => "Precondition Failed",
            Self::ContentTooLarge      => "Content Too Large",
            Self::UnsupportedMediaType => "Unsupported Media Type",
            Self::UnprocessableContent => "Unprocessable Content",
            Self::TooManyRequests      => "Too Many Requests",
            Self::InternalServerError  => "Internal Server Error",
            Self::NotImplemented       => "Not Implemented",
            Self::BadGateway           => "Bad Gateway",
            Self::ServiceUnavailable   => "Service Unavailable",
            Self::GatewayTimeout       => "Gateway Timeout",
        }
    }

    /// `true` for 1xx–3xx.
    pub fn is_success(self) -> bool {
        self.code() < 400
    }
}

/// Parses a status name (`"CREATED"`, case-insensitive) or code (`"201"`).
impl FromStr for Status {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(code) = s.parse::<u16>() {
            return Self::ALL.into_iter().find(|st| st.code() == code).ok_or(());
        }
        Self::ALL.into_iter().find(|st| st.name().eq_ignore_ascii_case(s)).ok_or(())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 { s.code() }
}

impl From<Status> for http::StatusCode {
    fn from(s: Status) -> http::StatusCode {
        http::StatusCode::from_u16(s.code()).unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_codes() {
        assert_eq!("CREATED".parse::<Status>(), Ok(Status::Created));
        assert_eq!("not_found".parse::<Status>(), Ok(Status::NotFound));
        assert_eq!("503".parse::<Status>(), Ok(Status::ServiceUnavailable));
        assert_eq!("TEAPOT".parse::<Status>(), Err(()));
        assert_eq!("299".parse::<Status>(), Err(()));
    }

    #[test]
    fn every_status_round_trips_through_its_name() {
        for st in Status::ALL {
            assert_eq!(st.name().parse::<Status>(), Ok(st));
            assert_eq!(http::StatusCode::from(st).as_u16(), st.code());
        }
    }

    #[test]
    fn defaults_to_ok() {
        assert_eq!(Status::default(), Status::Ok);
        assert!(Status::Ok.is_success());
        assert!(!Status::Forbidden.is_success());
    }
}
