use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::Utc;

use tollgate_auth::AuthorizationContext;
use tollgate_router::AuthMiddleware;
use tollgate_router::middleware::{extract_bearer, extract_cookie};

use crate::app::services::UsersService;

/// Resolves the session from the login cookie, falling back to a bearer
/// token when the cookie is absent or fails validation. Anything invalid is
/// anonymous.
pub struct SessionMiddleware {
    users: Arc<UsersService>,
    cookie_key: String,
}

impl SessionMiddleware {
    pub fn new(users: Arc<UsersService>, cookie_key: impl Into<String>) -> Self {
        Self {
            users,
            cookie_key: cookie_key.into(),
        }
    }
}

#[async_trait]
impl AuthMiddleware for SessionMiddleware {
    async fn resolve(&self, headers: &HeaderMap) -> AuthorizationContext {
        let now = Utc::now();
        let user = [extract_cookie(headers, &self.cookie_key), extract_bearer(headers)]
            .into_iter()
            .flatten()
            .find_map(|token| self.users.user_from_token(token, now));

        match user {
            Some(user) => AuthorizationContext::authenticated(user.principal()),
            None => AuthorizationContext::anonymous(),
        }
    }
}
