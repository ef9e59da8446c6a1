//! `intraportal-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod claims;
pub mod jwt;
pub mod policy;
pub mod principal;
pub mod roles;
pub mod user;

pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use policy::{can_create, can_moderate, can_moderate_department, can_read, can_write, ContentScope, CreateTarget};
pub use principal::Principal;
pub use roles::Role;
pub use user::{normalize_email, NewUser, ProfileUpdate, User, UserPatch, UserQuery};
