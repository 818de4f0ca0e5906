use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::http::header;
use axum::response::IntoResponse;
use chrono::Utc;
use serde_json::json;

use tollgate_auth::{AuthorizationContext, FailureReason};
use tollgate_router::errors::forbidden;
use tollgate_router::{ActionDecl, ActionFuture, BoundArgs, Controller, ParamSpec};

use crate::app::dto::{LoginRequest, RegisterRequest};
use crate::app::errors::{domain_error_to_response, service_error_to_response};
use crate::app::models::UserDto;
use crate::app::routes::common::{body, ok_json};
use crate::app::services::UsersService;
use crate::authz;

pub struct UsersController {
    users: Arc<UsersService>,
    cookie_key: String,
    session_ttl: Duration,
}

impl UsersController {
    pub fn new(users: Arc<UsersService>, cookie_key: impl Into<String>, session_ttl: Duration) -> Self {
        Self {
            users,
            cookie_key: cookie_key.into(),
            session_ttl,
        }
    }

    fn session_cookie(&self, token: &str) -> String {
        format!(
            "{}={}; HttpOnly; Secure; Path=/; Max-Age={}",
            self.cookie_key,
            token,
            self.session_ttl.as_secs()
        )
    }

    fn current_user(self: Arc<Self>, ctx: AuthorizationContext, _args: BoundArgs) -> ActionFuture {
        Box::pin(async move {
            let Some(principal) = ctx.principal() else {
                return Ok(forbidden(&[FailureReason::Unauthorized]));
            };
            Ok(ok_json(json!({ "user": UserDto::from(principal) })))
        })
    }

    fn login(self: Arc<Self>, _ctx: AuthorizationContext, args: BoundArgs) -> ActionFuture {
        Box::pin(async move {
            let req: LoginRequest = match body(&args, 0, "credentials") {
                Ok(req) => req,
                Err(resp) => return Ok(resp),
            };

            let token = match self.users.login(&req.email, &req.password, Utc::now()) {
                Ok(token) => token,
                Err(e) => return service_error_to_response(e),
            };

            Ok((
                [(header::SET_COOKIE, self.session_cookie(&token))],
                Json(json!({ "message": "Logged in successfully" })),
            )
                .into_response())
        })
    }

    fn register(self: Arc<Self>, _ctx: AuthorizationContext, args: BoundArgs) -> ActionFuture {
        Box::pin(async move {
            let req: RegisterRequest = match body(&args, 0, "registration") {
                Ok(req) => req,
                Err(resp) => return Ok(resp),
            };

            match self.users.register(&req.name, &req.email, &req.password) {
                Ok(user) => Ok(ok_json(json!({ "user": UserDto::from(&user) }))),
                Err(e) => Ok(domain_error_to_response(e)),
            }
        })
    }
}

impl Controller for UsersController {
    const BASE_PATH: &'static str = "/api/Users";

    fn actions() -> Vec<ActionDecl<Self>> {
        vec![
            ActionDecl::new("current_user", Self::current_user)
                .get("CurrentUser")
                .authorize(authz::AUTHENTICATED),
            ActionDecl::new("login", Self::login)
                .post("Login")
                .param(ParamSpec::body("credentials")),
            ActionDecl::new("register", Self::register)
                .post("Register")
                .param(ParamSpec::body("registration")),
        ]
    }
}
