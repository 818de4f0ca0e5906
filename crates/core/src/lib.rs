//! `tollgate-core`: shared domain primitives.
//!
//! Identifiers, entities, value objects, and the domain error model. No HTTP,
//! no storage.

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{ProductId, UserId};
pub use value_object::{Email, ValueObject};
