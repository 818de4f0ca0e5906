use std::str::FromStr;
use std::sync::Arc;

use serde_json::json;

use tollgate_auth::AuthorizationContext;
use tollgate_core::ProductId;
use tollgate_router::{ActionDecl, ActionFuture, BoundArgs, Controller, ParamSpec};

use crate::app::errors::domain_error_to_response;
use crate::app::routes::common::{count, ok_json, page_limit};
use crate::app::services::ProductsService;

/// Public catalog.
pub struct ProductsController {
    products: Arc<ProductsService>,
}

impl ProductsController {
    pub fn new(products: Arc<ProductsService>) -> Self {
        Self { products }
    }

    fn get_all_products(self: Arc<Self>, _ctx: AuthorizationContext, args: BoundArgs) -> ActionFuture {
        Box::pin(async move {
            let products = self.products.list(
                args.str(0),
                count(args.number(1), 1),
                page_limit(args.number(2)),
            );
            Ok(ok_json(json!({ "products": products })))
        })
    }

    fn get_product(self: Arc<Self>, _ctx: AuthorizationContext, args: BoundArgs) -> ActionFuture {
        Box::pin(async move {
            let found = ProductId::from_str(args.str(0).unwrap_or_default())
                .and_then(|id| self.products.get(id));

            Ok(match found {
                Ok(product) => ok_json(json!({ "product": product })),
                Err(e) => domain_error_to_response(e),
            })
        })
    }
}

impl Controller for ProductsController {
    const BASE_PATH: &'static str = "/api/Products";

    fn actions() -> Vec<ActionDecl<Self>> {
        vec![
            ActionDecl::new("get_all_products", Self::get_all_products)
                .get("GetAllProducts")
                .param(ParamSpec::query("name").optional())
                .param(ParamSpec::query("page").number().optional())
                .param(ParamSpec::query("limit").number().optional()),
            ActionDecl::new("get_product", Self::get_product)
                .get("GetProduct")
                .param(ParamSpec::query("id")),
        ]
    }
}
