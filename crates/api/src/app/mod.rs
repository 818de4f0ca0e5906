//! HTTP API application wiring.
//!
//! - `models.rs`: stored records and their DTO projections
//! - `dto.rs`: request bodies
//! - `services.rs`: business operations over the repositories
//! - `routes/`: controllers (one file per area)
//! - `errors.rs`: service errors -> responses

use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use tollgate_auth::Hs256SessionTokens;
use tollgate_infra::{Container, InMemoryRepository};
use tollgate_router::{Dispatcher, Registration, RegistrationContext};

use crate::authz;
use crate::config::{AdminSeed, AppConfig};
use crate::middleware::SessionMiddleware;

pub mod dto;
pub mod errors;
pub mod models;
pub mod routes;
pub mod services;

use models::{Product, User};
use routes::{ProductsAdminController, ProductsController, UsersAdminController, UsersController};
use services::{ProductsAdminService, ProductsService, UsersAdminService, UsersService};

/// Bind every singleton the application needs. Nothing is constructed until
/// first requested.
pub fn build_container(config: &AppConfig) -> anyhow::Result<Container> {
    let mut c = Container::new();

    c.bind_instance(config.clone())?;
    c.bind_instance(InMemoryRepository::<User>::new())?;
    c.bind_instance(InMemoryRepository::<Product>::new())?;

    c.bind_singleton(|c| {
        let config = c.get::<AppConfig>()?;
        let ttl = chrono::Duration::from_std(config.session_ttl)?;
        Ok(Hs256SessionTokens::new(config.jwt_secret.as_bytes(), ttl))
    })?;

    c.bind_singleton(|c| {
        Ok(UsersService::new(
            c.get::<InMemoryRepository<User>>()?,
            c.get::<Hs256SessionTokens>()?,
        ))
    })?;
    c.bind_singleton(|c| Ok(UsersAdminService::new(c.get::<InMemoryRepository<User>>()?)))?;
    c.bind_singleton(|c| Ok(ProductsService::new(c.get::<InMemoryRepository<Product>>()?)))?;
    c.bind_singleton(|c| Ok(ProductsAdminService::new(c.get::<InMemoryRepository<Product>>()?)))?;

    c.bind_singleton(|c| {
        let config = c.get::<AppConfig>()?;
        Ok(UsersController::new(
            c.get::<UsersService>()?,
            config.cookie_key.clone(),
            config.session_ttl,
        ))
    })?;
    c.bind_singleton(|c| Ok(UsersAdminController::new(c.get::<UsersAdminService>()?)))?;
    c.bind_singleton(|c| Ok(ProductsController::new(c.get::<ProductsService>()?)))?;
    c.bind_singleton(|c| Ok(ProductsAdminController::new(c.get::<ProductsAdminService>()?)))?;

    Ok(c)
}

/// Register policies and controllers, then freeze the routing table.
pub fn build_registration(container: &Container) -> anyhow::Result<Registration> {
    let mut ctx = RegistrationContext::new();
    authz::register_policies(&mut ctx)?;

    ctx.register_controller::<UsersController>(container)?
        .register_controller::<UsersAdminController>(container)?
        .register_controller::<ProductsController>(container)?
        .register_controller::<ProductsAdminController>(container)?;

    Ok(ctx.finish()?)
}

/// Create the configured administrator, granting every built-in permission.
///
/// An already-registered email is left untouched.
pub fn seed_admin(container: &Container, seed: &AdminSeed) -> anyhow::Result<()> {
    let users = container.get::<UsersService>()?;
    let admin = container.get::<UsersAdminService>()?;

    let user = match users.register(&seed.name, &seed.email, &seed.password) {
        Ok(user) => user,
        Err(tollgate_core::DomainError::Conflict(_)) => {
            tracing::info!(email = %seed.email, "admin already exists; not seeding");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    for permission in [
        authz::ADMIN_PERMISSION,
        authz::MANAGE_USERS_PERMISSION,
        authz::MANAGE_PRODUCTS_PERMISSION,
    ] {
        admin.add_permission(user.id, permission.as_str())?;
    }

    tracing::info!(user_id = %user.id, "seeded admin user");
    Ok(())
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Any configuration error aborts here, before a single route is served.
pub fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let container = build_container(config)?;
    let registration = build_registration(&container)?;

    if let Some(seed) = &config.admin {
        seed_admin(&container, seed)?;
    }

    let middleware = SessionMiddleware::new(container.get::<UsersService>()?, config.cookie_key.clone());
    let dispatcher = Dispatcher::new(registration, Arc::new(middleware))
        .with_deadline(config.request_timeout);

    Ok(dispatcher
        .into_router()
        .route("/health", get(routes::system::health)))
}
