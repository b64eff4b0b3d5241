use std::collections::HashSet;

use axum::http::Method;

use crate::routes::Action;
use crate::session::AuthSession;

/// What an authorizer gets to see about a request
#[derive(Debug, Clone, Copy)]
pub struct AuthRequest<'a> {
    pub action: Action,
    pub method: &'a Method,
    /// Path left after the mount prefix and route prefix are stripped
    pub path: &'a str,
    /// Verified session, if the request carried a valid `auth` cookie
    pub session: Option<&'a AuthSession>,
}

/// Pass/fail gate in front of every action. Admins built without one serve
/// every request.
pub trait Authorizer: Send + Sync {
    fn authorize(&self, request: &AuthRequest<'_>) -> bool;
}

impl<F> Authorizer for F
where
    F: Fn(&AuthRequest<'_>) -> bool + Send + Sync,
{
    fn authorize(&self, request: &AuthRequest<'_>) -> bool {
        self(request)
    }
}

/// Any request with a valid session passes
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireSession;

impl Authorizer for RequireSession {
    fn authorize(&self, request: &AuthRequest<'_>) -> bool {
        request.session.is_some()
    }
}

/// Only sessions for the listed usernames pass
#[derive(Debug, Clone, Default)]
pub struct AllowUsers {
    usernames: HashSet<String>,
}

impl AllowUsers {
    pub fn new<I, S>(usernames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            usernames: usernames.into_iter().map(Into::into).collect(),
        }
    }
}

impl Authorizer for AllowUsers {
    fn authorize(&self, request: &AuthRequest<'_>) -> bool {
        request
            .session
            .is_some_and(|session| self.usernames.contains(&session.username))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn request<'a>(session: Option<&'a AuthSession>, method: &'a Method) -> AuthRequest<'a> {
        AuthRequest {
            action: Action::List,
            method,
            path: "shop.orders",
            session,
        }
    }

    #[test]
    fn require_session_needs_a_session() {
        let alice = AuthSession::new("alice", Value::Null);
        assert!(RequireSession.authorize(&request(Some(&alice), &Method::GET)));
        assert!(!RequireSession.authorize(&request(None, &Method::GET)));
    }

    #[test]
    fn allow_users_checks_username() {
        let allow = AllowUsers::new(["alice"]);
        let alice = AuthSession::new("alice", Value::Null);
        let bob = AuthSession::new("bob", Value::Null);
        assert!(allow.authorize(&request(Some(&alice), &Method::GET)));
        assert!(!allow.authorize(&request(Some(&bob), &Method::GET)));
        assert!(!allow.authorize(&request(None, &Method::GET)));
    }

    fn read_only(req: &AuthRequest<'_>) -> bool {
        !req.action.is_mutating()
    }

    #[test]
    fn functions_are_authorizers() {
        assert!(read_only.authorize(&request(None, &Method::GET)));
    }
}
