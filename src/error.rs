//! Unified error type.

use std::fmt;

use http::header::{CONTENT_TYPE, HeaderValue};
use http::StatusCode;

use crate::response::{Render, ResponseWriter};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The error type returned by astor-bind's fallible operations.
///
/// Missing or malformed request values are *not* errors: they bind to the
/// type's zero value. This type covers misconfiguration at wrap time and the
/// few failures that can still happen while serving a wrapped action.
#[derive(Debug)]
pub enum Error {
    /// The number of parameter names does not fit the action's arity.
    Arity {
        expected: usize,
        given: usize,
        exact: bool,
    },
    /// A converter produced a value the declared argument type cannot hold.
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// An argument or tagged field has a type no registered converter can bind.
    NoConverter {
        ty: &'static str,
    },
    /// An untagged struct field has a type with no zero value to fall back to.
    NoZero {
        owner: &'static str,
        field: &'static str,
    },
    /// The request body could not be read.
    Body(BoxError),
    /// The request body is larger than the configured limit.
    PayloadTooLarge {
        limit: usize,
    },
}

impl Error {
    pub(crate) fn mismatch<T>(found: &crate::Value) -> Self {
        Self::Mismatch { expected: std::any::type_name::<T>(), found: found.kind_name() }
    }

    pub(crate) fn body(e: impl Into<BoxError>) -> Self {
        Self::Body(e.into())
    }

    /// Status code used when the error is rendered as a response.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Body(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Arity { .. } | Self::Mismatch { .. } | Self::NoConverter { .. } | Self::NoZero { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arity { expected, given, exact: true } => {
                write!(f, "wrong number of params: action takes {expected}, got {given}")
            }
            Self::Arity { expected, given, exact: false } => {
                write!(f, "wrong number of params: action takes at most {expected}, got {given}")
            }
            Self::Mismatch { expected, found } => {
                write!(f, "cannot bind {found} value into `{expected}`")
            }
            Self::NoConverter { ty } => write!(f, "no converter registered for `{ty}`"),
            Self::NoZero { owner, field } => {
                write!(f, "untagged field `{field}` of `{owner}` has no zero value")
            }
            Self::Body(e) => write!(f, "body: {e}"),
            Self::PayloadTooLarge { limit } => write!(f, "request body exceeds {limit} bytes"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Body(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl Render for Error {
    fn render_to(self, w: &mut ResponseWriter) {
        w.set_header(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
        w.write_status(self.status_code());
        w.write(self.to_string().as_bytes());
    }
}
