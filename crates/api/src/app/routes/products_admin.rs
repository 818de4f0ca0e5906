use std::str::FromStr;
use std::sync::Arc;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use tollgate_auth::AuthorizationContext;
use tollgate_core::{DomainResult, ProductId};
use tollgate_router::{ActionDecl, ActionFuture, BoundArgs, Controller, ParamSpec};

use crate::app::dto::ProductRequest;
use crate::app::errors::domain_error_to_response;
use crate::app::routes::common::{body, ok_json};
use crate::app::services::ProductsAdminService;
use crate::authz;

/// Catalog maintenance. Every action needs a session plus either
/// product-management or admin rights.
pub struct ProductsAdminController {
    admin: Arc<ProductsAdminService>,
}

fn product_id(args: &BoundArgs, index: usize) -> DomainResult<ProductId> {
    ProductId::from_str(args.str(index).unwrap_or_default())
}

fn respond<T>(result: DomainResult<T>, ok: impl FnOnce(T) -> Response) -> Response {
    match result {
        Ok(value) => ok(value),
        Err(e) => domain_error_to_response(e),
    }
}

impl ProductsAdminController {
    pub fn new(admin: Arc<ProductsAdminService>) -> Self {
        Self { admin }
    }

    fn create_product(self: Arc<Self>, _ctx: AuthorizationContext, args: BoundArgs) -> ActionFuture {
        Box::pin(async move {
            let req: ProductRequest = match body(&args, 0, "product") {
                Ok(req) => req,
                Err(resp) => return Ok(resp),
            };

            Ok(respond(self.admin.create(req), |product| {
                (StatusCode::CREATED, Json(json!({ "product": product }))).into_response()
            }))
        })
    }

    fn update_product(self: Arc<Self>, _ctx: AuthorizationContext, args: BoundArgs) -> ActionFuture {
        Box::pin(async move {
            let req: ProductRequest = match body(&args, 1, "product") {
                Ok(req) => req,
                Err(resp) => return Ok(resp),
            };

            let updated = product_id(&args, 0).and_then(|id| self.admin.update(id, req));
            Ok(respond(updated, |product| ok_json(json!({ "product": product }))))
        })
    }

    fn delete_product(self: Arc<Self>, _ctx: AuthorizationContext, args: BoundArgs) -> ActionFuture {
        Box::pin(async move {
            let deleted = product_id(&args, 0).and_then(|id| self.admin.delete(id));
            Ok(respond(deleted, |()| ok_json(json!({ "message": "Product deleted" }))))
        })
    }
}

impl Controller for ProductsAdminController {
    const BASE_PATH: &'static str = "/api/Admin/Products";

    fn actions() -> Vec<ActionDecl<Self>> {
        let guarded = |decl: ActionDecl<Self>| {
            decl.authorize(authz::AUTHENTICATED)
                .authorize_any([authz::MANAGE_PRODUCTS, authz::ADMIN])
        };

        vec![
            guarded(ActionDecl::new("create_product", Self::create_product).post("CreateProduct"))
                .param(ParamSpec::body("product")),
            guarded(ActionDecl::new("update_product", Self::update_product).put("UpdateProduct"))
                .param(ParamSpec::query("id"))
                .param(ParamSpec::body("product")),
            guarded(ActionDecl::new("delete_product", Self::delete_product).delete("DeleteProduct"))
                .param(ParamSpec::query("id")),
        ]
    }
}
