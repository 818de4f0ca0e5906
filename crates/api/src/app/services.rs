//! Application services. Stateless apart from the shared repositories they
//! hold; one instance of each serves every request.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use tollgate_auth::{Hs256SessionTokens, Permission, TokenError, TokenValidator};
use tollgate_core::{DomainError, DomainResult, Email, ProductId, UserId};
use tollgate_infra::{Repository, RepositoryError};

use crate::app::dto::ProductRequest;
use crate::app::models::{Product, User};

const MIN_PASSWORD_LEN: usize = 8;

/// Failures a service call can produce.
///
/// `Domain` errors are the caller's fault and map to 4xx responses; anything
/// else is internal.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

fn repository_error(e: RepositoryError) -> DomainError {
    match e {
        RepositoryError::ItemNotFound => DomainError::not_found(),
        RepositoryError::ItemAlreadyExists => DomainError::conflict("item already exists"),
    }
}

fn hash_password(salt: &str, password: &str) -> String {
    let digest = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(password.as_bytes())
        .finalize();

    digest.iter().map(|b| format!("{b:02x}")).collect()
}

// -------------------------
// Users
// -------------------------

pub struct UsersService {
    users: Arc<dyn Repository<User>>,
    tokens: Arc<Hs256SessionTokens>,
}

impl UsersService {
    pub fn new(users: Arc<dyn Repository<User>>, tokens: Arc<Hs256SessionTokens>) -> Self {
        Self { users, tokens }
    }

    fn find_by_email(&self, email: &Email) -> Option<User> {
        self.users
            .query(&|u: &User| &u.email == email, 0, 1)
            .into_iter()
            .next()
    }

    pub fn register(&self, name: &str, email: &str, password: &str) -> DomainResult<User> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name must not be empty"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let email = Email::parse(email)?;
        if self.find_by_email(&email).is_some() {
            return Err(DomainError::conflict("email is already registered"));
        }

        let salt = Uuid::new_v4().simple().to_string();
        let user = User {
            id: UserId::new(),
            name: name.to_string(),
            email,
            password_hash: hash_password(&salt, password),
            salt,
            permissions: Vec::new(),
        };

        let user = self.users.create(user).map_err(repository_error)?;
        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Verify credentials and issue a session token.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub fn login(&self, email: &str, password: &str, now: DateTime<Utc>) -> Result<String, ServiceError> {
        let user = Email::parse(email)
            .ok()
            .and_then(|email| self.find_by_email(&email))
            .filter(|user| hash_password(&user.salt, password) == user.password_hash)
            .ok_or(DomainError::InvalidCredentials)?;

        let token = self.tokens.issue(user.id, now)?;
        tracing::info!(user_id = %user.id, "session issued");
        Ok(token)
    }

    /// The user a session token belongs to, if the token is valid and the
    /// user still exists.
    pub fn user_from_token(&self, token: &str, now: DateTime<Utc>) -> Option<User> {
        match self.tokens.validate(token, now) {
            Ok(claims) => self.users.get_by_id(&claims.sub),
            Err(e) => {
                tracing::debug!(error = %e, "rejected session token");
                None
            }
        }
    }
}

pub struct UsersAdminService {
    users: Arc<dyn Repository<User>>,
}

impl UsersAdminService {
    pub fn new(users: Arc<dyn Repository<User>>) -> Self {
        Self { users }
    }

    pub fn list(&self, skip: usize, limit: usize) -> Vec<User> {
        self.users.query(&|_: &User| true, skip, limit)
    }

    pub fn add_permission(&self, user_id: UserId, permission: &str) -> DomainResult<User> {
        let permission = parse_permission(permission)?;
        let mut user = self.users.get_by_id(&user_id).ok_or(DomainError::NotFound)?;

        if !user.permissions.contains(&permission) {
            user.permissions.push(permission);
        }
        self.users.update(user).map_err(repository_error)
    }

    pub fn remove_permission(&self, user_id: UserId, permission: &str) -> DomainResult<User> {
        let permission = parse_permission(permission)?;
        let mut user = self.users.get_by_id(&user_id).ok_or(DomainError::NotFound)?;

        user.permissions.retain(|p| p != &permission);
        self.users.update(user).map_err(repository_error)
    }
}

fn parse_permission(raw: &str) -> DomainResult<Permission> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(DomainError::validation("permission must not be empty"));
    }
    Ok(Permission::new(raw.to_string()))
}

// -------------------------
// Products
// -------------------------

pub struct ProductsService {
    products: Arc<dyn Repository<Product>>,
}

impl ProductsService {
    pub fn new(products: Arc<dyn Repository<Product>>) -> Self {
        Self { products }
    }

    /// One page of products, optionally filtered by a case-insensitive name
    /// fragment. Pages are 1-based.
    pub fn list(&self, name: Option<&str>, page: usize, limit: usize) -> Vec<Product> {
        let needle = name.map(str::to_lowercase).filter(|n| !n.is_empty());
        let skip = page.saturating_sub(1).saturating_mul(limit);

        self.products.query(
            &|p: &Product| match &needle {
                Some(needle) => p.name.to_lowercase().contains(needle.as_str()),
                None => true,
            },
            skip,
            limit,
        )
    }

    pub fn get(&self, id: ProductId) -> DomainResult<Product> {
        self.products.get_by_id(&id).ok_or(DomainError::NotFound)
    }
}

pub struct ProductsAdminService {
    products: Arc<dyn Repository<Product>>,
}

impl ProductsAdminService {
    pub fn new(products: Arc<dyn Repository<Product>>) -> Self {
        Self { products }
    }

    pub fn create(&self, req: ProductRequest) -> DomainResult<Product> {
        let product = validate_product(ProductId::new(), req)?;
        let product = self.products.create(product).map_err(repository_error)?;
        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    pub fn update(&self, id: ProductId, req: ProductRequest) -> DomainResult<Product> {
        let product = validate_product(id, req)?;
        self.products.update(product).map_err(repository_error)
    }

    pub fn delete(&self, id: ProductId) -> DomainResult<()> {
        self.products.delete(&id).map_err(repository_error)?;
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }
}

fn validate_product(id: ProductId, req: ProductRequest) -> DomainResult<Product> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name must not be empty"));
    }
    if !req.price.is_finite() || req.price < 0.0 {
        return Err(DomainError::validation("price must be a non-negative number"));
    }

    Ok(Product {
        id,
        name: name.to_string(),
        description: req.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
        price: req.price,
    })
}
