pub mod middleware;
pub mod models;

pub use middleware::{auth_middleware, JwtVerifier};
pub use models::{JwtClaims, UserContext};
