//! Role-based access control: the role catalog, the caller identity, and
//! permission enforcement.

pub mod catalog;
pub mod enforcer;
pub mod identity;

pub use catalog::{RoleCatalog, RoleDefinition};
pub use enforcer::RbacEnforcer;
pub use identity::Identity;
