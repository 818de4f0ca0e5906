use std::str::FromStr;
use std::sync::Arc;

use serde_json::json;

use tollgate_auth::AuthorizationContext;
use tollgate_core::{DomainResult, UserId};
use tollgate_router::{ActionDecl, ActionFuture, BoundArgs, Controller, ParamSpec};

use crate::app::dto::PermissionChangeRequest;
use crate::app::errors::domain_error_to_response;
use crate::app::models::{User, UserDto};
use crate::app::routes::common::{body, count, ok_json, page_limit};
use crate::app::services::UsersAdminService;
use crate::authz;

pub struct UsersAdminController {
    admin: Arc<UsersAdminService>,
}

impl UsersAdminController {
    pub fn new(admin: Arc<UsersAdminService>) -> Self {
        Self { admin }
    }

    fn get_all_users(self: Arc<Self>, _ctx: AuthorizationContext, args: BoundArgs) -> ActionFuture {
        Box::pin(async move {
            let users: Vec<UserDto> = self
                .admin
                .list(count(args.number(0), 0), page_limit(args.number(1)))
                .iter()
                .map(UserDto::from)
                .collect();

            Ok(ok_json(json!({ "users": users })))
        })
    }

    fn add_permission(self: Arc<Self>, _ctx: AuthorizationContext, args: BoundArgs) -> ActionFuture {
        Box::pin(async move {
            let req: PermissionChangeRequest = match body(&args, 0, "request") {
                Ok(req) => req,
                Err(resp) => return Ok(resp),
            };

            let changed = UserId::from_str(&req.user_id)
                .and_then(|id| self.admin.add_permission(id, &req.permission));
            Ok(permission_response(changed, "Permission added to user"))
        })
    }

    fn remove_permission(self: Arc<Self>, _ctx: AuthorizationContext, args: BoundArgs) -> ActionFuture {
        Box::pin(async move {
            let req: PermissionChangeRequest = match body(&args, 0, "request") {
                Ok(req) => req,
                Err(resp) => return Ok(resp),
            };

            let changed = UserId::from_str(&req.user_id)
                .and_then(|id| self.admin.remove_permission(id, &req.permission));
            Ok(permission_response(changed, "Permission removed from user"))
        })
    }
}

fn permission_response(changed: DomainResult<User>, message: &str) -> axum::response::Response {
    match changed {
        Ok(user) => {
            tracing::info!(user_id = %user.id, message);
            ok_json(json!({ "message": message, "user": UserDto::from(&user) }))
        }
        Err(e) => domain_error_to_response(e),
    }
}

impl Controller for UsersAdminController {
    const BASE_PATH: &'static str = "/api/Admin/Users";

    fn actions() -> Vec<ActionDecl<Self>> {
        vec![
            ActionDecl::new("get_all_users", Self::get_all_users)
                .get("GetAllUsers")
                .authorize(authz::MANAGE_USERS)
                .param(ParamSpec::query("skip").number().optional())
                .param(ParamSpec::query("limit").number().optional()),
            ActionDecl::new("add_permission", Self::add_permission)
                .post("AddPermissionToUser")
                .authorize(authz::MANAGE_USERS)
                .param(ParamSpec::body("request")),
            ActionDecl::new("remove_permission", Self::remove_permission)
                .delete("RemovePermissionFromUser")
                .authorize(authz::MANAGE_USERS)
                .param(ParamSpec::body("request")),
        ]
    }
}
