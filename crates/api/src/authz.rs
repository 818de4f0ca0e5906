//! Named policies the controllers refer to.

use tollgate_auth::{AuthenticatedPolicy, Permission, PermissionPolicy};
use tollgate_router::{RegistrationContext, RegistrationError};

pub const AUTHENTICATED: &str = "Authenticated";
pub const MANAGE_USERS: &str = "ManageUsers";
pub const MANAGE_PRODUCTS: &str = "ManageProducts";
pub const ADMIN: &str = "Admin";

pub const MANAGE_USERS_PERMISSION: Permission = Permission::from_static("manageUsers");
pub const MANAGE_PRODUCTS_PERMISSION: Permission = Permission::from_static("manageProducts");
pub const ADMIN_PERMISSION: Permission = Permission::from_static("admin");

pub fn register_policies(ctx: &mut RegistrationContext) -> Result<(), RegistrationError> {
    ctx.register_policy(AUTHENTICATED, AuthenticatedPolicy)?
        .register_policy(MANAGE_USERS, PermissionPolicy::new(MANAGE_USERS_PERMISSION))?
        .register_policy(MANAGE_PRODUCTS, PermissionPolicy::new(MANAGE_PRODUCTS_PERMISSION))?
        .register_policy(ADMIN, PermissionPolicy::new(ADMIN_PERMISSION))?;
    Ok(())
}
