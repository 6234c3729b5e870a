//! Caller identity taken from headers set by the upstream auth proxy.
//!
//! Sessions are issued elsewhere. The gateway in front of this service
//! authenticates the user and forwards the identity as `x-user-*` headers;
//! a request without a valid `x-user-id` is rejected with 401.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::domain::UserId;
use crate::error::TicketingError;
use crate::service::Requester;

/// Header carrying the authenticated user's UUID.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the user's display name.
pub const USER_NAME_HEADER: &str = "x-user-name";
/// Header carrying the user's email.
pub const USER_EMAIL_HEADER: &str = "x-user-email";
/// Header carrying the user's role: `admin`, or `staff` for gate scanners.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Authenticated caller extracted from request headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub Requester);

impl CurrentUser {
    /// Fails with [`TicketingError::Forbidden`] unless the caller is an
    /// administrator.
    ///
    /// # Errors
    ///
    /// Returns [`TicketingError::Forbidden`] for non-admin callers.
    pub fn require_admin(&self) -> Result<(), TicketingError> {
        if self.0.is_admin {
            Ok(())
        } else {
            Err(TicketingError::Forbidden(
                "administrator role required".to_string(),
            ))
        }
    }

    /// Fails with [`TicketingError::Forbidden`] unless the caller works the
    /// gate or is an administrator.
    ///
    /// # Errors
    ///
    /// Returns [`TicketingError::Forbidden`] for attendees and organizers.
    pub fn require_gate_staff(&self) -> Result<(), TicketingError> {
        if self.0.is_gate_staff || self.0.is_admin {
            Ok(())
        } else {
            Err(TicketingError::Forbidden(
                "gate staff role required".to_string(),
            ))
        }
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = TicketingError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header(&parts.headers, USER_ID_HEADER)
            .and_then(|raw| Uuid::parse_str(&raw).ok())
            .ok_or(TicketingError::Unauthenticated)?;

        let role = header(&parts.headers, USER_ROLE_HEADER).unwrap_or_default();
        let is_admin = role.eq_ignore_ascii_case("admin");
        let is_gate_staff = role.eq_ignore_ascii_case("staff");

        Ok(Self(Requester {
            user_id: UserId::from_uuid(user_id),
            name: header(&parts.headers, USER_NAME_HEADER),
            email: header(&parts.headers, USER_EMAIL_HEADER),
            is_admin,
            is_gate_staff,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use axum::http::Request;

    use super::*;

    async fn extract(builder: axum::http::request::Builder) -> Result<CurrentUser, TicketingError> {
        let Ok(request) = builder.body(()) else {
            panic!("request build failed");
        };
        let (mut parts, ()) = request.into_parts();
        CurrentUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn missing_or_malformed_id_is_unauthenticated() {
        let missing = extract(Request::builder()).await;
        assert!(matches!(missing, Err(TicketingError::Unauthenticated)));

        let malformed = extract(Request::builder().header(USER_ID_HEADER, "not-a-uuid")).await;
        assert!(matches!(malformed, Err(TicketingError::Unauthenticated)));
    }

    #[tokio::test]
    async fn headers_populate_requester() {
        let id = Uuid::new_v4();
        let builder = Request::builder()
            .header(USER_ID_HEADER, id.to_string())
            .header(USER_NAME_HEADER, "Ada Lovelace")
            .header(USER_EMAIL_HEADER, "ada@example.com")
            .header(USER_ROLE_HEADER, "Admin");
        let Ok(CurrentUser(user)) = extract(builder).await else {
            panic!("extraction failed");
        };
        assert_eq!(user.user_id, UserId::from_uuid(id));
        assert_eq!(user.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(user.email.as_deref(), Some("ada@example.com"));
        assert!(user.is_admin);
    }

    #[tokio::test]
    async fn other_roles_are_not_admin() {
        let builder = Request::builder()
            .header(USER_ID_HEADER, Uuid::new_v4().to_string())
            .header(USER_ROLE_HEADER, "organizer");
        let Ok(user) = extract(builder).await else {
            panic!("extraction failed");
        };
        assert!(!user.0.is_admin);
        assert!(matches!(
            user.require_admin(),
            Err(TicketingError::Forbidden(_))
        ));
        assert!(matches!(
            user.require_gate_staff(),
            Err(TicketingError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn staff_role_opens_the_gate_only() {
        let builder = Request::builder()
            .header(USER_ID_HEADER, Uuid::new_v4().to_string())
            .header(USER_ROLE_HEADER, "STAFF");
        let Ok(user) = extract(builder).await else {
            panic!("extraction failed");
        };
        assert!(user.0.is_gate_staff);
        assert!(user.require_gate_staff().is_ok());
        assert!(user.require_admin().is_err());
    }
}
