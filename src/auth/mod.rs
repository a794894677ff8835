pub mod claims;
pub mod jwt;

pub use jwt::{AuthUser, JwtVerifier};
