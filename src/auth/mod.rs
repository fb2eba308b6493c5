//! JWT access tokens and the route guards built on them.

pub mod middleware;
pub mod token;

pub use middleware::{is_admin, verify_admin, verify_token, ADMIN_ROLE};
pub use token::{Claims, TokenService};
