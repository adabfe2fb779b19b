//! HTTP method types.

use std::str::FromStr;

use derive_more::Display;

/// HTTP request method.
///
/// Parsing is case-insensitive: `"get"`, `"Get"` and `"GET"` all yield [`Method::Get`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display)]
pub enum Method {
    /// `GET`, the default verb.
    #[default]
    #[display("GET")]
    Get,
    /// `DELETE`.
    #[display("DELETE")]
    Delete,
    /// `HEAD`; responses carry no payload.
    #[display("HEAD")]
    Head,
    /// `OPTIONS`.
    #[display("OPTIONS")]
    Options,
    /// `POST`, sent with a body.
    #[display("POST")]
    Post,
    /// `PUT`, sent with a body.
    #[display("PUT")]
    Put,
    /// `PATCH`, sent with a body.
    #[display("PATCH")]
    Patch,
}

impl Method {
    /// All supported methods.
    pub const ALL: [Self; 7] = [
        Self::Get,
        Self::Delete,
        Self::Head,
        Self::Options,
        Self::Post,
        Self::Put,
        Self::Patch,
    ];

    /// Lower-case name, also used as the per-method header group key.
    #[must_use]
    pub const fn lowercase(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Delete => "delete",
            Self::Head => "head",
            Self::Options => "options",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
        }
    }

    /// Returns `true` if the method is safe (does not modify resources).
    #[must_use]
    pub const fn is_safe(&self) -> bool {
        matches!(self, Self::Get | Self::Head | Self::Options)
    }

    /// Returns `true` if the method is idempotent.
    #[must_use]
    pub const fn is_idempotent(&self) -> bool {
        matches!(
            self,
            Self::Get | Self::Head | Self::Options | Self::Put | Self::Delete
        )
    }

    /// Returns `true` if the method carries a request body in the client surface.
    #[must_use]
    pub const fn has_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl FromStr for Method {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.lowercase().eq_ignore_ascii_case(s))
            .ok_or_else(|| crate::Error::invalid_request(format!("unsupported HTTP method: {s}")))
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Delete => Self::DELETE,
            Method::Head => Self::HEAD,
            Method::Options => Self::OPTIONS,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Patch => Self::PATCH,
        }
    }
}

impl TryFrom<http::Method> for Method {
    type Error = crate::Error;

    fn try_from(method: http::Method) -> Result<Self, Self::Error> {
        method.as_str().parse()
    }
}
