//! Basic-auth credential injection.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::descriptor::{Authorization, RequestDescriptor};
use crate::error::{ApiError, Result};

/// Credential schemes an operation can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AuthScheme {
    /// HTTP Basic authentication.
    Basic,
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => f.write_str("basic-auth"),
        }
    }
}

/// Username/password pair for the basic-auth scheme.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// `Basic <base64(username:password)>`
    pub fn basic_header_value(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {token}")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Attach the credentials each required scheme asks for.
///
/// Fails with `MissingCredentials` when a scheme is required but nothing is
/// configured; this happens before the descriptor reaches a transport.
pub fn apply<R>(
    mut descriptor: RequestDescriptor<R>,
    credentials: Option<&Credentials>,
) -> Result<RequestDescriptor<R>> {
    for scheme in descriptor.auth_settings().clone() {
        match scheme {
            AuthScheme::Basic => {
                let credentials =
                    credentials.ok_or(ApiError::MissingCredentials { scheme })?;
                descriptor.set_authorization(Authorization::new(credentials.basic_header_value()));
            }
        }
    }
    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::RequestDescriptor;
    use crate::http::HttpMethod;

    fn descriptor(auth: bool) -> RequestDescriptor<serde_json::Value> {
        let builder = RequestDescriptor::builder(HttpMethod::Get, "/api/v1/members");
        let builder = if auth { builder.auth(AuthScheme::Basic) } else { builder };
        builder.build().unwrap()
    }

    #[test]
    fn basic_header_uses_standard_encoding() {
        let credentials = Credentials::new("Aladdin", "open sesame");
        assert_eq!(
            credentials.basic_header_value(),
            "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ=="
        );
    }

    #[test]
    fn apply_attaches_authorization_when_required() {
        let credentials = Credentials::new("gym", "secret");
        let applied = apply(descriptor(true), Some(&credentials)).unwrap();
        assert_eq!(
            applied.authorization(),
            Some(credentials.basic_header_value().as_str())
        );
    }

    #[test]
    fn apply_fails_without_credentials() {
        let err = apply(descriptor(true), None).unwrap_err();
        assert!(matches!(
            err,
            ApiError::MissingCredentials {
                scheme: AuthScheme::Basic
            }
        ));
    }

    #[test]
    fn apply_is_noop_for_anonymous_operations() {
        let credentials = Credentials::new("gym", "secret");
        let applied = apply(descriptor(false), Some(&credentials)).unwrap();
        assert!(applied.authorization().is_none());
        assert!(apply(descriptor(false), None).is_ok());
    }

    #[test]
    fn debug_hides_password() {
        let rendered = format!("{:?}", Credentials::new("gym", "hunter2"));
        assert!(rendered.contains("gym"));
        assert!(!rendered.contains("hunter2"));
    }
}
