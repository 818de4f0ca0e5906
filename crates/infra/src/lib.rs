//! Infrastructure collaborators: storage and the singleton container.

pub mod container;
pub mod repository;

pub use container::{Container, ContainerError};
pub use repository::{InMemoryRepository, Repository, RepositoryError};
