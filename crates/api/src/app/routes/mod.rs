//! Controllers (one file per area) and the routes that live outside the
//! controller table.

pub mod common;
pub mod products;
pub mod products_admin;
pub mod system;
pub mod users;
pub mod users_admin;

pub use products::ProductsController;
pub use products_admin::ProductsAdminController;
pub use users::UsersController;
pub use users_admin::UsersAdminController;
