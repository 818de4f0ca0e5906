//! Stored records and their public projections.

use serde::Serialize;

use tollgate_auth::{Permission, Principal};
use tollgate_core::{Email, Entity, ProductId, UserId};

/// A registered account. Credentials never leave this type.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    /// Hex SHA-256 of `salt || password`.
    pub password_hash: String,
    pub salt: String,
    pub permissions: Vec<Permission>,
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &UserId {
        &self.id
    }
}

impl User {
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            permissions: self.permissions.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDto {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub permissions: Vec<Permission>,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            permissions: user.permissions.clone(),
        }
    }
}

impl From<&Principal> for UserDto {
    fn from(p: &Principal) -> Self {
        Self {
            id: p.user_id,
            name: p.name.clone(),
            email: p.email.clone(),
            permissions: p.permissions.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &ProductId {
        &self.id
    }
}
